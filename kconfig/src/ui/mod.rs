//! Backend-independent terminal interface.
//!
//! Front ends draw into [`Region`]s registered on a [`Screen`]. The screen
//! composites them back to front, diffs the result against the previous
//! frame and hands only the changed cells to a [`Terminal`], which is the
//! one piece that talks to an actual terminal.

use std::io;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub mod menuconfig;

pub use menuconfig::MenuConfig;

/// Placeholder in the cell to the right of a double-width character.
/// Backends print nothing for it.
pub const WIDE_CONTINUATION: char = '\0';

/// Columns `c` takes up on a terminal: 0, 1 or 2.
pub fn char_width(c: char) -> u16 {
    c.width().map_or(0, |w| w.min(2) as u16)
}

/// Columns `s` takes up on a terminal.
pub fn str_width(s: &str) -> usize {
    s.width()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Color {
    #[default]
    Default,
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    Grey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Style {
    pub fg: Color,
    pub bg: Color,
    pub bold: bool,
    pub reverse: bool,
}

impl Style {
    pub const fn new(fg: Color, bg: Color) -> Self {
        Self {
            fg,
            bg,
            bold: false,
            reverse: false,
        }
    }

    pub const fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub const fn reverse(mut self) -> Self {
        self.reverse = true;
        self
    }
}

/// One character position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub style: Style,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            style: Style::default(),
        }
    }
}

/// Input events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    PageUp,
    PageDown,
    Home,
    End,
    Enter,
    Esc,
    Backspace,
    Delete,
    Tab,
    Char(char),
    /// The terminal was resized to `(width, height)`.
    Resize(u16, u16),
}

/// A rectangle of cells at a fixed screen position.
#[derive(Debug, Clone)]
pub struct Region {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
    cells: Vec<Cell>,
}

impl Region {
    pub fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
            cells: vec![Cell::default(); usize::from(width) * usize::from(height)],
        }
    }

    fn index(&self, x: u16, y: u16) -> Option<usize> {
        (x < self.width && y < self.height)
            .then(|| usize::from(y) * usize::from(self.width) + usize::from(x))
    }

    pub fn cell(&self, x: u16, y: u16) -> Option<Cell> {
        self.index(x, y).map(|i| self.cells[i])
    }

    /// Sets every cell to a blank in `style`.
    pub fn fill(&mut self, style: Style) {
        self.cells.fill(Cell { ch: ' ', style });
    }

    pub fn clear(&mut self) {
        self.fill(Style::default());
    }

    /// Sets one cell. Overwriting either half of a double-width character
    /// blanks the other half.
    pub fn put_char(&mut self, x: u16, y: u16, ch: char, style: Style) {
        let Some(i) = self.index(x, y) else {
            return;
        };
        if self.cells[i].ch == WIDE_CONTINUATION && x > 0 {
            self.cells[i - 1].ch = ' ';
        }
        if char_width(self.cells[i].ch) == 2 {
            if let Some(next) = self.index(x + 1, y) {
                if self.cells[next].ch == WIDE_CONTINUATION {
                    self.cells[next].ch = ' ';
                }
            }
        }
        self.cells[i] = Cell { ch, style };
    }

    /// Writes `s` starting at `(x, y)`, clipped at the right edge. Returns
    /// the number of columns written.
    ///
    /// Double-width characters take two cells; one that would straddle the
    /// right edge is replaced by a blank. Zero-width characters are dropped.
    pub fn put_str(&mut self, x: u16, y: u16, s: &str, style: Style) -> u16 {
        let mut col = x;
        for ch in s.chars() {
            if col >= self.width {
                break;
            }
            let ch = if ch.is_control() { ' ' } else { ch };
            match char_width(ch) {
                0 => continue,
                2 if col + 1 >= self.width => {
                    self.put_char(col, y, ' ', style);
                    col += 1;
                }
                2 => {
                    self.put_char(col, y, ch, style);
                    self.put_char(col + 1, y, WIDE_CONTINUATION, style);
                    col += 2;
                }
                _ => {
                    self.put_char(col, y, ch, style);
                    col += 1;
                }
            }
        }
        col.saturating_sub(x)
    }

    /// Draws a single-line frame around the edge.
    pub fn draw_border(&mut self, style: Style) {
        if self.width < 2 || self.height < 2 {
            return;
        }
        let (r, b) = (self.width - 1, self.height - 1);
        for x in 1..r {
            self.put_char(x, 0, '─', style);
            self.put_char(x, b, '─', style);
        }
        for y in 1..b {
            self.put_char(0, y, '│', style);
            self.put_char(r, y, '│', style);
        }
        self.put_char(0, 0, '┌', style);
        self.put_char(r, 0, '┐', style);
        self.put_char(0, b, '└', style);
        self.put_char(r, b, '┘', style);
    }
}

/// Handle to a region registered on a [`Screen`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionId(usize);

/// Terminal backend.
pub trait Terminal {
    /// Current size as `(width, height)`.
    fn size(&self) -> io::Result<(u16, u16)>;

    /// Writes changed cells as `(x, y, cell)` and flushes.
    fn draw(&mut self, cells: &[(u16, u16, Cell)]) -> io::Result<()>;

    /// Blocks until the next key or resize event.
    fn read_key(&mut self) -> io::Result<Key>;
}

/// Composites regions and sends the difference to the last frame to a
/// [`Terminal`].
#[derive(Debug)]
pub struct Screen {
    width: u16,
    height: u16,
    regions: Vec<Region>,
    prev: Option<Vec<Cell>>,
}

impl Screen {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            regions: Vec::new(),
            prev: None,
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// Changes the size. The next flush redraws everything.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.prev = None;
    }

    /// Registers a region on top of the existing ones.
    pub fn add_region(&mut self, region: Region) -> RegionId {
        self.regions.push(region);
        RegionId(self.regions.len() - 1)
    }

    pub fn region_mut(&mut self, id: RegionId) -> &mut Region {
        &mut self.regions[id.0]
    }

    /// Drops all regions. The previous frame is kept for diffing.
    pub fn clear_regions(&mut self) {
        self.regions.clear();
    }

    /// Renders all regions back to front into a full frame.
    pub fn composite(&self) -> Vec<Cell> {
        let (w, h) = (usize::from(self.width), usize::from(self.height));
        let mut frame = vec![Cell::default(); w * h];
        for region in &self.regions {
            for ry in 0..region.height {
                let y = usize::from(region.y) + usize::from(ry);
                if y >= h {
                    break;
                }
                for rx in 0..region.width {
                    let x = usize::from(region.x) + usize::from(rx);
                    if x >= w {
                        break;
                    }
                    if let Some(cell) = region.cell(rx, ry) {
                        frame[y * w + x] = cell;
                    }
                }
            }
        }
        frame
    }

    /// Cells that differ from the last flushed frame.
    pub fn diff(&self, frame: &[Cell]) -> Vec<(u16, u16, Cell)> {
        let w = usize::from(self.width.max(1));
        frame
            .iter()
            .enumerate()
            .filter(|(i, cell)| match &self.prev {
                Some(prev) => prev.get(*i) != Some(cell),
                None => true,
            })
            .filter_map(|(i, cell)| {
                let x = u16::try_from(i % w).ok()?;
                let y = u16::try_from(i / w).ok()?;
                Some((x, y, *cell))
            })
            .collect()
    }

    /// Composites, draws the changed cells and remembers the frame.
    pub fn flush(&mut self, term: &mut dyn Terminal) -> io::Result<()> {
        let frame = self.composite();
        let changes = self.diff(&frame);
        if !changes.is_empty() {
            term.draw(&changes)?;
        }
        self.prev = Some(frame);
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::VecDeque;

    use super::*;

    /// In-memory terminal fed from a key script.
    pub(crate) struct ScriptTerminal {
        pub width: u16,
        pub height: u16,
        pub cells: Vec<Cell>,
        pub keys: VecDeque<Key>,
        pub draws: usize,
    }

    impl ScriptTerminal {
        pub fn new(width: u16, height: u16, keys: &[Key]) -> Self {
            Self {
                width,
                height,
                cells: vec![Cell::default(); usize::from(width) * usize::from(height)],
                keys: keys.iter().copied().collect(),
                draws: 0,
            }
        }

        pub fn row(&self, y: u16) -> String {
            let w = usize::from(self.width);
            let start = usize::from(y) * w;
            self.cells[start..start + w]
                .iter()
                .map(|c| c.ch)
                .filter(|&ch| ch != WIDE_CONTINUATION)
                .collect()
        }

        pub fn contains(&self, text: &str) -> bool {
            (0..self.height).any(|y| self.row(y).contains(text))
        }
    }

    impl Terminal for ScriptTerminal {
        fn size(&self) -> io::Result<(u16, u16)> {
            Ok((self.width, self.height))
        }

        fn draw(&mut self, cells: &[(u16, u16, Cell)]) -> io::Result<()> {
            self.draws += 1;
            for &(x, y, cell) in cells {
                let i = usize::from(y) * usize::from(self.width) + usize::from(x);
                if let Some(c) = self.cells.get_mut(i) {
                    *c = cell;
                }
            }
            Ok(())
        }

        fn read_key(&mut self) -> io::Result<Key> {
            self.keys
                .pop_front()
                .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "out of keys"))
        }
    }

    #[test]
    fn test_regions_composite_back_to_front() {
        let mut screen = Screen::new(10, 3);
        let back = screen.add_region(Region::new(0, 0, 10, 3));
        screen.region_mut(back).put_str(0, 1, "background", Style::default());
        let front = screen.add_region(Region::new(2, 1, 3, 1));
        screen.region_mut(front).put_str(0, 0, "TOP", Style::default());

        let mut term = ScriptTerminal::new(10, 3, &[]);
        screen.flush(&mut term).unwrap();
        assert_eq!(term.row(1), "baTOPround");
    }

    #[test]
    fn test_flush_sends_only_changes() {
        let mut screen = Screen::new(8, 2);
        let id = screen.add_region(Region::new(0, 0, 8, 2));
        screen.region_mut(id).put_str(0, 0, "hello", Style::default());

        let mut term = ScriptTerminal::new(8, 2, &[]);
        screen.flush(&mut term).unwrap();
        assert_eq!(term.draws, 1);

        // Same content, nothing to draw
        screen.flush(&mut term).unwrap();
        assert_eq!(term.draws, 1);

        screen.region_mut(id).put_char(0, 0, 'j', Style::default());
        let frame = screen.composite();
        assert_eq!(screen.diff(&frame).len(), 1);
    }

    #[test]
    fn test_put_str_clips() {
        let mut region = Region::new(0, 0, 4, 1);
        assert_eq!(region.put_str(2, 0, "abcdef", Style::default()), 2);
        assert_eq!(region.cell(3, 0).map(|c| c.ch), Some('b'));
        assert_eq!(region.cell(4, 0), None);
    }

    #[test]
    fn test_put_str_wide_chars() {
        let mut region = Region::new(0, 0, 6, 1);
        assert_eq!(region.put_str(0, 0, "中文x", Style::default()), 5);
        assert_eq!(region.cell(0, 0).map(|c| c.ch), Some('中'));
        assert_eq!(region.cell(1, 0).map(|c| c.ch), Some(WIDE_CONTINUATION));
        assert_eq!(region.cell(2, 0).map(|c| c.ch), Some('文'));
        assert_eq!(region.cell(4, 0).map(|c| c.ch), Some('x'));

        // No room for the second half
        let mut region = Region::new(0, 0, 3, 1);
        assert_eq!(region.put_str(0, 0, "ab中", Style::default()), 3);
        assert_eq!(region.cell(2, 0).map(|c| c.ch), Some(' '));

        let mut screen = Screen::new(6, 1);
        let id = screen.add_region(Region::new(0, 0, 6, 1));
        screen.region_mut(id).put_str(0, 0, "中文x", Style::default());
        // Overwriting the tail of a wide character clears its head
        screen.region_mut(id).put_char(3, 0, 'y', Style::default());
        let mut term = ScriptTerminal::new(6, 1, &[]);
        screen.flush(&mut term).unwrap();
        assert_eq!(term.row(0), "中 yx ");
        assert_eq!(str_width("中文x"), 5);
    }
}
