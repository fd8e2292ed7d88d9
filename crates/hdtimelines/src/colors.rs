/// Qualitative palette, cycled per topic
const PALETTE: [&str; 10] = [
    "#636efa", "#ef553b", "#00cc96", "#ab63fa", "#ffa15a", "#19d3f3", "#ff6692", "#b6e880",
    "#ff97ff", "#fecb52",
];

/// Round-robin colour picker
#[derive(Debug, Clone, Default)]
pub struct ColorGen {
    next: usize,
}

impl ColorGen {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Iterator for ColorGen {
    type Item = &'static str;

    fn next(&mut self) -> Option<Self::Item> {
        let color = PALETTE[self.next % PALETTE.len()];
        self.next += 1;
        Some(color)
    }
}
