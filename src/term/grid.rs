//! Shadow screen model
//!
//! The engine is the only writer to the terminal, so it keeps its own copy of
//! what is on screen: a bounded grid of cells plus a cursor. Every character
//! the engine emits passes through this grid first, which is what makes
//! capture/restore of the whole display possible without reading the real
//! console back.

use bitflags::bitflags;
use crossterm::style::Color;
use unicode_width::UnicodeWidthChar;

bitflags! {
    /// Display attribute flags carried by a cell
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct CellFlags: u8 {
        const BOLD    = 0b0000_0001;
        const DIM     = 0b0000_0010;
        const REVERSE = 0b0000_0100;
        const HIDDEN  = 0b0000_1000;
    }
}

/// Foreground/background encoding plus attribute flags for one cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellAttrs {
    pub fg: Color,
    pub bg: Color,
    pub flags: CellFlags,
}

impl Default for CellAttrs {
    fn default() -> Self {
        Self {
            fg: Color::Reset,
            bg: Color::Reset,
            flags: CellFlags::empty(),
        }
    }
}

/// One screen position: character payload and display attributes.
///
/// Immutable once captured into a snapshot. The second half of a wide
/// character is stored as a `'\0'` continuation cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerminalCell {
    pub ch: char,
    pub attrs: CellAttrs,
}

impl TerminalCell {
    pub fn is_continuation(&self) -> bool {
        self.ch == '\0'
    }
}

impl Default for TerminalCell {
    fn default() -> Self {
        Self {
            ch: ' ',
            attrs: CellAttrs::default(),
        }
    }
}

/// Bounded cell grid with a cursor, mirroring the visible terminal area
#[derive(Debug, Clone)]
pub struct ScreenGrid {
    cols: u16,
    rows: u16,
    cells: Vec<TerminalCell>,
    cursor_col: u16,
    cursor_row: u16,
}

impl ScreenGrid {
    pub fn new(cols: u16, rows: u16) -> Self {
        let cols = cols.max(1);
        let rows = rows.max(1);
        Self {
            cols,
            rows,
            cells: vec![TerminalCell::default(); cols as usize * rows as usize],
            cursor_col: 0,
            cursor_row: 0,
        }
    }

    pub fn cols(&self) -> u16 {
        self.cols
    }

    pub fn rows(&self) -> u16 {
        self.rows
    }

    pub fn cursor(&self) -> (u16, u16) {
        (self.cursor_col, self.cursor_row)
    }

    pub fn cells(&self) -> &[TerminalCell] {
        &self.cells
    }

    pub fn cell(&self, col: u16, row: u16) -> &TerminalCell {
        &self.cells[row as usize * self.cols as usize + col as usize]
    }

    fn cell_mut(&mut self, col: u16, row: u16) -> &mut TerminalCell {
        &mut self.cells[row as usize * self.cols as usize + col as usize]
    }

    /// Put a printable character at the cursor and advance it, wrapping and
    /// scrolling as needed. Zero-width characters are dropped.
    pub fn put_char(&mut self, ch: char, attrs: CellAttrs) {
        let width = ch.width().unwrap_or(0) as u16;
        if width == 0 {
            return;
        }

        // Wrap before writing when the glyph no longer fits on this row
        if self.cursor_col + width > self.cols {
            self.newline();
        }

        let (col, row) = (self.cursor_col, self.cursor_row);
        *self.cell_mut(col, row) = TerminalCell { ch, attrs };
        if width == 2 && col + 1 < self.cols {
            *self.cell_mut(col + 1, row) = TerminalCell { ch: '\0', attrs };
        }
        self.cursor_col = col + width;
    }

    /// Move the cursor to the start of the next row, scrolling at the bottom
    pub fn newline(&mut self) {
        self.cursor_col = 0;
        if self.cursor_row + 1 >= self.rows {
            self.scroll_up();
        } else {
            self.cursor_row += 1;
        }
    }

    /// Erase the cell before the cursor and step back onto it.
    /// A cursor at column zero stays put.
    pub fn backspace(&mut self) {
        if self.cursor_col == 0 {
            return;
        }
        self.cursor_col -= 1;
        let (col, row) = (self.cursor_col, self.cursor_row);
        *self.cell_mut(col, row) = TerminalCell::default();
    }

    pub fn move_to(&mut self, col: u16, row: u16) {
        self.cursor_col = col.min(self.cols.saturating_sub(1));
        self.cursor_row = row.min(self.rows.saturating_sub(1));
    }

    pub fn clear(&mut self) {
        self.cells.fill(TerminalCell::default());
        self.cursor_col = 0;
        self.cursor_row = 0;
    }

    /// Replace this grid's dimensions and contents wholesale
    pub fn load(&mut self, cols: u16, rows: u16, cells: Vec<TerminalCell>, cursor: (u16, u16)) {
        debug_assert_eq!(cells.len(), cols as usize * rows as usize);
        self.cols = cols;
        self.rows = rows;
        self.cells = cells;
        self.cursor_col = cursor.0.min(cols.saturating_sub(1));
        self.cursor_row = cursor.1.min(rows.saturating_sub(1));
    }

    fn scroll_up(&mut self) {
        let cols = self.cols as usize;
        self.cells.drain(..cols);
        self.cells
            .extend(std::iter::repeat(TerminalCell::default()).take(cols));
    }
}
