//! Screen-buffer snapshot and restore
//!
//! Full-screen takeovers (screensaver, crash screen, file pager) borrow the
//! display and must hand it back unchanged. A [`BufferSnapshot`] captures the
//! visible cell grid, the cursor, and the logical dimensions; restoring it
//! repaints every cell and repositions the cursor. A snapshot is owned by the
//! call site that captured it and consumed exactly once by the matching
//! restore.

use std::io::{self, Write};

use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::style::{Print, SetBackgroundColor, SetForegroundColor};
use thiserror::Error;

use super::console::Console;
use super::grid::{CellAttrs, ScreenGrid, TerminalCell};
use super::waiter::KeyProbe;

/// Most cells a single capture or restore may move.
///
/// Inherited from the classic console API, where a single buffer read or
/// write above 64K cells fails with "not enough storage".
pub const MAX_SNAPSHOT_CELLS: u32 = 65_535;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("screen buffer of {cols}x{rows} cells exceeds the single-operation limit")]
    BufferTooLarge { cols: u16, rows: u16 },

    #[error("failed to repaint the terminal: {0}")]
    Io(#[from] io::Error),
}

/// A frozen copy of the visible screen
#[derive(Debug)]
pub struct BufferSnapshot {
    cols: u16,
    rows: u16,
    cursor_col: u16,
    cursor_row: u16,
    cells: Vec<TerminalCell>,
}

impl BufferSnapshot {
    /// Freeze the given grid. Has no effect on what is displayed.
    pub fn capture(grid: &ScreenGrid) -> Result<Self, SnapshotError> {
        let (cols, rows) = (grid.cols(), grid.rows());
        if u32::from(cols) * u32::from(rows) > MAX_SNAPSHOT_CELLS {
            return Err(SnapshotError::BufferTooLarge { cols, rows });
        }
        let (cursor_col, cursor_row) = grid.cursor();
        Ok(Self {
            cols,
            rows,
            cursor_col,
            cursor_row,
            cells: grid.cells().to_vec(),
        })
    }

    #[allow(dead_code)]
    pub fn dimensions(&self) -> (u16, u16) {
        (self.cols, self.rows)
    }

    #[allow(dead_code)]
    pub fn cursor(&self) -> (u16, u16) {
        (self.cursor_col, self.cursor_row)
    }
}

impl<W: Write, K: KeyProbe> Console<W, K> {
    /// Capture the current screen contents, cursor, and dimensions
    pub fn snapshot(&self) -> Result<BufferSnapshot, SnapshotError> {
        BufferSnapshot::capture(self.grid())
    }

    /// Write every captured cell back to its position, reset the logical
    /// dimensions, and reposition the cursor, leaving the terminal as it was
    /// at capture time. `trailing_blanks` rows are emitted afterwards when
    /// the caller wants the prompt pushed below the restored content.
    pub fn restore(
        &mut self,
        snapshot: BufferSnapshot,
        trailing_blanks: u16,
    ) -> Result<(), SnapshotError> {
        let BufferSnapshot {
            cols,
            rows,
            cursor_col,
            cursor_row,
            cells,
        } = snapshot;

        // Repaint row by row, switching colors only when they change
        let mut painted: Option<CellAttrs> = None;
        for row in 0..rows {
            queue!(self.out_mut(), MoveTo(0, row))?;
            for col in 0..cols {
                let cell = cells[row as usize * cols as usize + col as usize];
                if cell.is_continuation() {
                    continue;
                }
                if painted.map_or(true, |attrs| attrs != cell.attrs) {
                    queue!(
                        self.out_mut(),
                        SetForegroundColor(cell.attrs.fg),
                        SetBackgroundColor(cell.attrs.bg),
                    )?;
                    painted = Some(cell.attrs);
                }
                queue!(self.out_mut(), Print(cell.ch))?;
            }
        }
        queue!(self.out_mut(), MoveTo(cursor_col, cursor_row))?;

        self.grid_mut()
            .load(cols, rows, cells, (cursor_col, cursor_row));

        // Back to the colors the session was drawing with
        let attrs = self.current_attrs();
        queue!(
            self.out_mut(),
            SetForegroundColor(attrs.fg),
            SetBackgroundColor(attrs.bg),
        )?;

        self.blank_lines(trailing_blanks)?;
        self.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::waiter::testkeys::FakeKeys;
    use crossterm::style::Color;

    fn headless() -> Console<Vec<u8>, FakeKeys> {
        Console::new(Vec::new(), FakeKeys::empty(), 12, 4)
    }

    #[test]
    fn test_round_trip_restores_grid_and_cursor() {
        let mut console = headless();
        console.set_fg(Color::Yellow).unwrap();
        console.put_str("before\nshot").unwrap();

        let reference = console.grid().clone();
        let snapshot = console.snapshot().unwrap();

        // Takeover: wipe the screen and scribble over it
        console.clear().unwrap();
        console.put_str("garbage everywhere").unwrap();

        console.restore(snapshot, 0).unwrap();

        assert_eq!(console.grid().cells(), reference.cells());
        assert_eq!(console.grid().cursor(), reference.cursor());
        assert_eq!(console.grid().cols(), reference.cols());
        assert_eq!(console.grid().rows(), reference.rows());
    }

    #[test]
    fn test_capture_has_no_side_effects() {
        let mut console = headless();
        console.put_str("untouched").unwrap();
        let reference = console.grid().clone();

        let _snapshot = console.snapshot().unwrap();

        assert_eq!(console.grid().cells(), reference.cells());
        assert_eq!(console.grid().cursor(), reference.cursor());
    }

    #[test]
    fn test_trailing_blanks_advance_cursor() {
        let mut console = headless();
        console.put_str("x").unwrap();
        let snapshot = console.snapshot().unwrap();

        console.restore(snapshot, 1).unwrap();

        assert_eq!(console.grid().cursor(), (0, 1));
    }

    #[test]
    fn test_oversized_grid_is_rejected() {
        let grid = ScreenGrid::new(300, 300);
        match BufferSnapshot::capture(&grid) {
            Err(SnapshotError::BufferTooLarge { cols, rows }) => {
                assert_eq!((cols, rows), (300, 300));
            }
            other => panic!("expected BufferTooLarge, got {other:?}"),
        }
    }
}
