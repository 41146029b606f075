//! Bank-switch state machine.
//!
//! One `observe` call per bus cycle, before the data byte for that
//! cycle is computed. The order matters: the byte served on a
//! switching cycle already comes from the new bank, so computing data
//! first and switching second would serve stale data exactly when it
//! hurts most.
//!
//! Hotspots compare on the low 13 address bits — the console only
//! decodes 13, so the cartridge sees every mirror.

use cart_core::BusCycle;
use format_a26::BankScheme;

/// Stack-page address whose access arms the FE rule.
const FE_TRIGGER: u16 = 0x01FE;

/// Depth of the address history the FE rule inspects.
const FE_HISTORY: usize = 2;

/// Tracks the currently selected bank for a scheme.
pub struct BankSwitcher {
    scheme: BankScheme,
    current: usize,
    /// Recent cycle addresses, newest last. Only the FE rule reads
    /// this; fixed-size so observing stays allocation-free.
    history: [u16; FE_HISTORY],
}

impl BankSwitcher {
    /// New switcher at the scheme's power-up bank.
    #[must_use]
    pub fn new(scheme: BankScheme) -> Self {
        Self {
            scheme,
            current: scheme.reset_bank(),
            // Sentinel that matches no trigger address
            history: [0xFFFF; FE_HISTORY],
        }
    }

    /// Currently selected bank.
    #[must_use]
    pub fn current(&self) -> usize {
        self.current
    }

    /// Feed one bus cycle. Hotspots trigger on access alone, read or
    /// write; non-qualifying cycles leave the bank untouched.
    pub fn observe(&mut self, cycle: &BusCycle) {
        let masked = cycle.address & 0x1FFF;
        match self.scheme {
            BankScheme::None => {}
            BankScheme::F8 => match masked {
                0x1FF8 => self.current = 0,
                0x1FF9 => self.current = 1,
                _ => {}
            },
            BankScheme::F6 => {
                if (0x1FF6..=0x1FF9).contains(&masked) {
                    self.current = usize::from(masked - 0x1FF6);
                }
            }
            BankScheme::F4 => {
                if (0x1FF4..=0x1FFB).contains(&masked) {
                    self.current = usize::from(masked - 0x1FF4);
                }
            }
            BankScheme::Fe => {
                // The switch hardware watches the JSR/RTS target byte
                // passing through $01FE; the very next fetch reveals
                // which half the CPU jumped into. A13 set means the
                // $Fxxx half, served by bank 0.
                if self.history[FE_HISTORY - 1] & 0x1FFF == FE_TRIGGER {
                    self.current = if cycle.address & 0x2000 != 0 { 0 } else { 1 };
                }
            }
        }
        self.history.rotate_left(1);
        self.history[FE_HISTORY - 1] = cycle.address;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observe_reads(switcher: &mut BankSwitcher, addresses: &[u16]) {
        for &addr in addresses {
            switcher.observe(&BusCycle::read(addr));
        }
    }

    #[test]
    fn f8_hotspots_select_banks() {
        let mut sw = BankSwitcher::new(BankScheme::F8);
        assert_eq!(sw.current(), 1); // power-up bank
        observe_reads(&mut sw, &[0x1FF8]);
        assert_eq!(sw.current(), 0);
        observe_reads(&mut sw, &[0x1FF9]);
        assert_eq!(sw.current(), 1);
    }

    #[test]
    fn f8_triggers_on_writes_too() {
        let mut sw = BankSwitcher::new(BankScheme::F8);
        sw.observe(&BusCycle::write(0x1FF8));
        assert_eq!(sw.current(), 0);
    }

    #[test]
    fn f8_hotspots_match_mirrors() {
        // Console only decodes 13 address bits: $FFF8 mirrors $1FF8
        let mut sw = BankSwitcher::new(BankScheme::F8);
        observe_reads(&mut sw, &[0xFFF8]);
        assert_eq!(sw.current(), 0);
    }

    #[test]
    fn f6_hotspots_select_distinct_banks() {
        let mut sw = BankSwitcher::new(BankScheme::F6);
        let mut seen = Vec::new();
        for addr in [0x1FF6u16, 0x1FF7, 0x1FF8, 0x1FF9] {
            observe_reads(&mut sw, &[addr]);
            seen.push(sw.current());
        }
        assert_eq!(seen, vec![0, 1, 2, 3]);
    }

    #[test]
    fn f4_hotspots_cover_eight_banks() {
        let mut sw = BankSwitcher::new(BankScheme::F4);
        for (i, addr) in (0x1FF4u16..=0x1FFB).enumerate() {
            observe_reads(&mut sw, &[addr]);
            assert_eq!(sw.current(), i);
        }
    }

    #[test]
    fn non_hotspots_never_switch() {
        let mut sw = BankSwitcher::new(BankScheme::F6);
        observe_reads(&mut sw, &[0x1FF5]);
        assert_eq!(sw.current(), 0);
        observe_reads(&mut sw, &[0x1FF7]);
        assert_eq!(sw.current(), 1);
        // Everything around the hotspot range, reads and writes
        observe_reads(&mut sw, &[0x0000, 0x1000, 0x1FFA, 0x1FFF, 0x1FF5]);
        sw.observe(&BusCycle::write(0x1234));
        assert_eq!(sw.current(), 1);
    }

    #[test]
    fn fe_selects_bank_from_post_trigger_fetch() {
        let mut sw = BankSwitcher::new(BankScheme::Fe);
        // $01FE access, then a fetch in the $Dxxx half: bank 1
        observe_reads(&mut sw, &[0x01FE, 0xD000]);
        assert_eq!(sw.current(), 1);
        // $01FE access, then a fetch in the $Fxxx half: bank 0
        observe_reads(&mut sw, &[0x01FE, 0xF123]);
        assert_eq!(sw.current(), 0);
    }

    #[test]
    fn fe_only_the_immediately_following_cycle_decides() {
        let mut sw = BankSwitcher::new(BankScheme::Fe);
        observe_reads(&mut sw, &[0x01FE, 0xD000]);
        assert_eq!(sw.current(), 1);
        // A later $Fxxx fetch without a fresh trigger changes nothing
        observe_reads(&mut sw, &[0xF000, 0xF001]);
        assert_eq!(sw.current(), 1);
    }

    #[test]
    fn fe_ignores_untriggered_fetches() {
        let mut sw = BankSwitcher::new(BankScheme::Fe);
        observe_reads(&mut sw, &[0xF000, 0xD000, 0x01FD, 0xD000]);
        assert_eq!(sw.current(), 0);
    }
}
