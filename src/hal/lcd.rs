//! 16x2 character LCD with a repaint cache.

use super::Hardware;

/// Characters per row of the 16x2 display.
pub const LCD_COLUMNS: usize = 16;

/// Character LCD with a cache of what is currently on screen.
#[derive(Debug, Default)]
pub struct Lcd {
    shown: Option<(String, String)>,
}

impl Lcd {
    /// Display of unknown content; the first update always repaints.
    pub fn new() -> Self {
        Self::default()
    }

    /// Repaint unconditionally. Rows longer than the display are cut.
    pub fn show(&mut self, hw: &mut dyn Hardware, line1: &str, line2: &str) {
        let line1 = fit(line1);
        let line2 = fit(line2);
        hw.write_lcd(&line1, &line2);
        self.shown = Some((line1, line2));
    }

    /// Repaint only when the (truncated) content differs from the screen.
    pub fn update(&mut self, hw: &mut dyn Hardware, line1: &str, line2: &str) {
        let unchanged = self
            .shown
            .as_ref()
            .is_some_and(|(a, b)| *a == fit(line1) && *b == fit(line2));
        if !unchanged {
            self.show(hw, line1, line2);
        }
    }

    /// Blank both rows.
    pub fn clear(&mut self, hw: &mut dyn Hardware) {
        self.show(hw, "", "");
    }
}

fn fit(line: &str) -> String {
    line.chars().take(LCD_COLUMNS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::SimulatedHardware;

    #[test]
    fn update_skips_identical_content() {
        let mut hw = SimulatedHardware::new();
        let mut lcd = Lcd::new();

        lcd.update(&mut hw, "Trivia Time!", "Get Ready...");
        lcd.update(&mut hw, "Trivia Time!", "Get Ready...");
        lcd.update(&mut hw, "Trivia Time!", "Get Ready...");
        assert_eq!(hw.lcd_writes(), 1);

        lcd.update(&mut hw, "Correct!", "");
        assert_eq!(hw.lcd_writes(), 2);
        assert_eq!(hw.lcd_lines(), ("Correct!".to_string(), String::new()));
    }

    #[test]
    fn show_always_repaints() {
        let mut hw = SimulatedHardware::new();
        let mut lcd = Lcd::new();

        lcd.show(&mut hw, "a", "b");
        lcd.show(&mut hw, "a", "b");
        assert_eq!(hw.lcd_writes(), 2);
    }

    #[test]
    fn long_rows_are_truncated_before_comparison() {
        let mut hw = SimulatedHardware::new();
        let mut lcd = Lcd::new();

        lcd.update(&mut hw, "When you find it, press", "x");
        lcd.update(&mut hw, "When you find it, again", "x");
        assert_eq!(hw.lcd_writes(), 1);
        assert_eq!(hw.lcd_lines(), ("When you find it".to_string(), "x".to_string()));
    }
}
