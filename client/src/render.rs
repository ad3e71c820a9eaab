use std::io;

use console::Term;
use tetris_core::{GameSnapshot, Shape, StackRow, COLS, ROWS};

/// One renderable cell of a terminal frame.
#[derive(Clone, PartialEq)]
pub enum TermCell {
    Cell(Option<Shape>),
    Ghost,
    BorderVertical,
    BorderHorizontal,
    BorderBottomLeft,
    BorderBottomRight,
    BorderTopLeft,
    BorderTopRight,
    Space,
    Message(String),
}

pub trait TermStyle {
    fn display<'a>(&self, cell: &'a TermCell) -> &'a str;
    fn width(&self, cell: &TermCell) -> usize;
}

pub trait TermRender {
    fn output(&self, style: &impl TermStyle) -> Vec<Vec<TermCell>>;

    fn render(&self, style: &impl TermStyle) -> Vec<String> {
        let mut lines = Vec::new();
        for row in self.output(style) {
            let mut line = String::new();
            for cell in &row {
                line.push_str(style.display(cell));
            }
            lines.push(line);
        }
        lines
    }
}

/// Make all lines in a block the same display width by padding with spaces.
fn pad_block_right(block: &mut [Vec<TermCell>], style: &impl TermStyle) {
    let widths: Vec<usize> = block
        .iter()
        .map(|row| row.iter().map(|cell| style.width(cell)).sum())
        .collect();
    let width = widths.iter().copied().max().unwrap_or(0);
    for (row, line_width) in block.iter_mut().zip(widths) {
        for _ in 0..width - line_width {
            row.push(TermCell::Space);
        }
    }
}

/// Bare output for tests.
pub struct PlainTermStyle;

impl TermStyle for PlainTermStyle {
    fn display<'a>(&self, cell: &'a TermCell) -> &'a str {
        match cell {
            TermCell::Cell(None) => "  ",
            TermCell::Cell(Some(_)) => "[]",
            TermCell::Ghost => "::",
            TermCell::BorderVertical => "|",
            TermCell::BorderHorizontal => "--",
            TermCell::BorderBottomLeft
            | TermCell::BorderBottomRight
            | TermCell::BorderTopLeft
            | TermCell::BorderTopRight => "+",
            TermCell::Space => " ",
            TermCell::Message(s) => s.as_str(),
        }
    }

    fn width(&self, cell: &TermCell) -> usize {
        match cell {
            TermCell::Cell(_) | TermCell::Ghost | TermCell::BorderHorizontal => 2,
            TermCell::BorderVertical
            | TermCell::BorderBottomLeft
            | TermCell::BorderBottomRight
            | TermCell::BorderTopLeft
            | TermCell::BorderTopRight
            | TermCell::Space => 1,
            TermCell::Message(s) => s.chars().count(),
        }
    }
}

/// Inverse-video colored cells, shape colors per the classic palette.
pub struct AnsiTermStyle;

impl TermStyle for AnsiTermStyle {
    fn display<'a>(&self, cell: &'a TermCell) -> &'a str {
        match cell {
            TermCell::Cell(None) => "  ",
            TermCell::Cell(Some(Shape::I)) => "\x1b[7m\x1b[36m[]\x1b[0m",
            TermCell::Cell(Some(Shape::J)) => "\x1b[7m\x1b[34m[]\x1b[0m",
            TermCell::Cell(Some(Shape::L)) => "\x1b[7m\x1b[38;5;214m[]\x1b[0m",
            TermCell::Cell(Some(Shape::O)) => "\x1b[7m\x1b[33m[]\x1b[0m",
            TermCell::Cell(Some(Shape::S)) => "\x1b[7m\x1b[32m[]\x1b[0m",
            TermCell::Cell(Some(Shape::Z)) => "\x1b[7m\x1b[31m[]\x1b[0m",
            TermCell::Cell(Some(Shape::T)) => "\x1b[7m\x1b[35m[]\x1b[0m",
            TermCell::Ghost => "[]",
            TermCell::BorderVertical => "|",
            TermCell::BorderHorizontal => "--",
            TermCell::BorderBottomLeft
            | TermCell::BorderBottomRight
            | TermCell::BorderTopLeft
            | TermCell::BorderTopRight => "+",
            TermCell::Space => " ",
            TermCell::Message(s) => s.as_str(),
        }
    }

    fn width(&self, cell: &TermCell) -> usize {
        match cell {
            TermCell::Cell(_) | TermCell::Ghost | TermCell::BorderHorizontal => 2,
            TermCell::BorderVertical
            | TermCell::BorderBottomLeft
            | TermCell::BorderBottomRight
            | TermCell::BorderTopLeft
            | TermCell::BorderTopRight
            | TermCell::Space => 1,
            TermCell::Message(s) => s.chars().count(),
        }
    }
}

#[derive(Clone, Copy, PartialEq)]
enum CellView {
    Empty,
    Ghost,
    Filled(Shape),
}

/// A 20x10 well, stored floor-up and emitted ceiling-first with side and
/// bottom borders.
pub struct Board {
    cells: [[CellView; COLS]; ROWS],
}

impl Board {
    /// The local player's board: settled stack, ghost projection (unless
    /// disabled) and the current piece painted over it.
    pub fn local(snapshot: &GameSnapshot, ghost: bool) -> Board {
        let mut board = Board {
            cells: [[CellView::Empty; COLS]; ROWS],
        };
        for (y, row) in snapshot.stack.iter().enumerate() {
            for (x, cell) in row.iter().enumerate() {
                if let Some(shape) = cell {
                    board.cells[y][x] = CellView::Filled(*shape);
                }
            }
        }
        if let Some(piece) = &snapshot.current {
            if ghost {
                board.paint(&piece.grid, piece.x, piece.ghost_y, CellView::Ghost);
            }
            board.paint(&piece.grid, piece.x, piece.y, CellView::Filled(piece.shape));
        }
        board
    }

    /// The opponent's board as received on the wire.
    pub fn remote(stack: &[StackRow; ROWS]) -> Board {
        let mut board = Board {
            cells: [[CellView::Empty; COLS]; ROWS],
        };
        for (y, row) in stack.iter().enumerate() {
            for (x, cell) in row.iter().enumerate() {
                if let Some(shape) = cell {
                    board.cells[y][x] = CellView::Filled(*shape);
                }
            }
        }
        board
    }

    fn paint(&mut self, grid: &[Vec<bool>], x: i32, y: i32, view: CellView) {
        for (ir, row) in grid.iter().enumerate() {
            for (ic, &set) in row.iter().enumerate() {
                if !set {
                    continue;
                }
                let cy = y - ir as i32;
                let cx = x + ic as i32;
                if (0..ROWS as i32).contains(&cy) && (0..COLS as i32).contains(&cx) {
                    self.cells[cy as usize][cx as usize] = view;
                }
            }
        }
    }
}

impl TermRender for Board {
    fn output(&self, _style: &impl TermStyle) -> Vec<Vec<TermCell>> {
        let mut lines = Vec::with_capacity(ROWS + 1);
        for y in (0..ROWS).rev() {
            let mut line = vec![TermCell::BorderVertical];
            for x in 0..COLS {
                line.push(match self.cells[y][x] {
                    CellView::Empty => TermCell::Cell(None),
                    CellView::Ghost => TermCell::Ghost,
                    CellView::Filled(shape) => TermCell::Cell(Some(shape)),
                });
            }
            line.push(TermCell::BorderVertical);
            lines.push(line);
        }
        let mut bottom = vec![TermCell::BorderBottomLeft];
        for _ in 0..COLS {
            bottom.push(TermCell::BorderHorizontal);
        }
        bottom.push(TermCell::BorderBottomRight);
        lines.push(bottom);
        lines
    }
}

/// The next-piece preview: the top two grid rows in a bordered 4-wide box.
pub struct Preview {
    rows: [[Option<Shape>; 4]; 2],
}

impl Preview {
    pub fn new(snapshot: &GameSnapshot) -> Preview {
        let mut rows = [[None; 4]; 2];
        if let Some(next) = &snapshot.next {
            for (ir, row) in next.grid.iter().take(2).enumerate() {
                for (ic, &set) in row.iter().enumerate() {
                    if set {
                        rows[ir][ic] = Some(next.shape);
                    }
                }
            }
        }
        Preview { rows }
    }
}

impl TermRender for Preview {
    fn output(&self, _style: &impl TermStyle) -> Vec<Vec<TermCell>> {
        let mut lines = Vec::with_capacity(4);
        let mut top = vec![TermCell::BorderTopLeft];
        for _ in 0..4 {
            top.push(TermCell::BorderHorizontal);
        }
        top.push(TermCell::BorderTopRight);
        lines.push(top);
        for row in &self.rows {
            let mut line = vec![TermCell::BorderVertical];
            for cell in row {
                line.push(TermCell::Cell(*cell));
            }
            line.push(TermCell::BorderVertical);
            lines.push(line);
        }
        let mut bottom = vec![TermCell::BorderBottomLeft];
        for _ in 0..4 {
            bottom.push(TermCell::BorderHorizontal);
        }
        bottom.push(TermCell::BorderBottomRight);
        lines.push(bottom);
        lines
    }
}

/// A board with a text column (and optionally the preview) to its right.
pub struct GamePane {
    board: Board,
    preview: Option<Preview>,
    text: Vec<String>,
}

impl GamePane {
    pub fn new(board: Board, preview: Option<Preview>, text: Vec<String>) -> GamePane {
        GamePane {
            board,
            preview,
            text,
        }
    }
}

impl TermRender for GamePane {
    fn output(&self, style: &impl TermStyle) -> Vec<Vec<TermCell>> {
        let mut lines = self.board.output(style);
        let mut side = match &self.preview {
            Some(preview) => preview.output(style),
            None => Vec::new(),
        };
        side.push(Vec::new());
        side.extend(
            self.text
                .iter()
                .map(|s| vec![TermCell::Message(s.clone())]),
        );
        // the side column is always shorter than the well
        side.resize(lines.len(), Vec::new());
        for (line, mut side_line) in lines.iter_mut().zip(side.into_iter()) {
            line.push(TermCell::Space);
            line.append(&mut side_line);
        }
        pad_block_right(&mut lines, style);
        lines
    }
}

/// The full frame: local pane on the left, opponent pane on the right when
/// playing online, with the versus caption underneath.
pub struct MatchFrame {
    player: GamePane,
    opponent: Option<GamePane>,
    caption: String,
}

impl MatchFrame {
    pub fn new(player: GamePane, opponent: Option<GamePane>, caption: String) -> MatchFrame {
        MatchFrame {
            player,
            opponent,
            caption,
        }
    }
}

impl TermRender for MatchFrame {
    fn output(&self, style: &impl TermStyle) -> Vec<Vec<TermCell>> {
        let mut lines = self.player.output(style);
        if let Some(opponent) = &self.opponent {
            let right = opponent.output(style);
            for (line, mut right_line) in lines.iter_mut().zip(right.into_iter()) {
                for _ in 0..4 {
                    line.push(TermCell::Space);
                }
                line.append(&mut right_line);
            }
        }
        lines.push(Vec::new());
        lines.push(vec![TermCell::Message(self.caption.clone())]);
        lines
    }
}

/// What the lobby overlay is currently telling the player. The messages are
/// mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Welcome,
    GameOver,
    YouWon,
    NoOpponent,
    Waiting,
    Error,
}

const BOX_WIDTH: usize = 38;

fn boxed(lines: &[&str]) -> Vec<String> {
    let mut out = Vec::with_capacity(lines.len() + 2);
    out.push(format!("+{}+", "-".repeat(BOX_WIDTH)));
    for line in lines {
        let pad = BOX_WIDTH.saturating_sub(line.chars().count());
        let left = pad / 2;
        out.push(format!(
            "|{}{}{}|",
            " ".repeat(left),
            line,
            " ".repeat(pad - left)
        ));
    }
    out.push(format!("+{}+", "-".repeat(BOX_WIDTH)));
    out
}

/// The boxed overlay for a notice.
pub fn notice_box(notice: Notice) -> Vec<String> {
    match notice {
        Notice::Welcome => boxed(&[
            "Welcome to Terminal Tetris",
            "",
            "(p)lay   (o)nline   (q)uit",
        ]),
        Notice::GameOver => boxed(&["Game Over :)", "", "(p)lay   (o)nline   (q)uit"]),
        Notice::YouWon => boxed(&["You won!", "", "(p)lay   (o)nline   (q)uit"]),
        Notice::NoOpponent => boxed(&[
            "no one to play with :(",
            "",
            "(p)lay   (o)nline   (q)uit",
        ]),
        Notice::Waiting => boxed(&["waiting for player...", "", "(c)ancel"]),
        Notice::Error => boxed(&[
            "something went wrong :(",
            "",
            "(p)lay   (o)nline   (q)uit",
        ]),
    }
}

/// The opponent as last seen on the wire.
pub struct OpponentView {
    pub name: String,
    pub stack: [StackRow; ROWS],
    pub lines_cleared: i32,
}

impl OpponentView {
    pub fn unknown() -> OpponentView {
        OpponentView {
            name: String::new(),
            stack: [[None; COLS]; ROWS],
            lines_cleared: 0,
        }
    }
}

/// The versus caption, both names trimmed or padded to nine characters.
fn versus(left: &str, right: &str) -> String {
    const NAME_WIDTH: usize = 9;
    let clip = |name: &str, pad_left: bool| -> String {
        let mut out: String = name.chars().take(NAME_WIDTH).collect();
        let pad = " ".repeat(NAME_WIDTH - out.chars().count());
        if pad_left {
            out = format!("{pad}{out}");
        } else {
            out.push_str(&pad);
        }
        out
    };
    format!(" {} <- vs -> {} ", clip(left, true), clip(right, false))
}

/// Draws frames onto the terminal. All layout work happens in the pure
/// [`TermRender`] pipeline; this type only positions the cursor and writes.
pub struct Renderer {
    term: Term,
    ghost: bool,
    name: String,
}

impl Renderer {
    pub fn new(term: Term, ghost: bool, name: String) -> Renderer {
        Renderer { term, ghost, name }
    }

    pub fn draw_playing(
        &self,
        snapshot: &GameSnapshot,
        opponent: Option<&OpponentView>,
    ) -> io::Result<()> {
        let lines = playing_lines(snapshot, opponent, self.ghost, &self.name, &AnsiTermStyle);
        self.draw(&lines)
    }

    pub fn draw_lobby(&self, notice: Notice) -> io::Result<()> {
        self.term.clear_screen()?;
        let lines = notice_box(notice);
        self.overlay(&lines)
    }

    pub fn draw_waiting(&self) -> io::Result<()> {
        self.term.clear_screen()?;
        self.overlay(&notice_box(Notice::Waiting))
    }

    fn draw(&self, lines: &[String]) -> io::Result<()> {
        self.term.move_cursor_to(0, 0)?;
        for line in lines {
            self.term.clear_line()?;
            self.term.write_line(line)?;
        }
        self.term.flush()
    }

    fn overlay(&self, lines: &[String]) -> io::Result<()> {
        for (i, line) in lines.iter().enumerate() {
            self.term.move_cursor_to(8, 9 + i)?;
            self.term.write_str(line)?;
        }
        self.term.flush()
    }
}

/// Pure frame assembly, separated from the terminal for tests.
pub fn playing_lines(
    snapshot: &GameSnapshot,
    opponent: Option<&OpponentView>,
    ghost: bool,
    name: &str,
    style: &impl TermStyle,
) -> Vec<String> {
    let player_text = vec![
        format!("Level: {}", snapshot.level),
        format!("Lines: {}", snapshot.lines_cleared),
    ];
    let player = GamePane::new(
        Board::local(snapshot, ghost),
        Some(Preview::new(snapshot)),
        player_text,
    );
    let (opponent_pane, caption) = match opponent {
        Some(view) => {
            let text = vec![format!("Lines: {}", view.lines_cleared)];
            (
                Some(GamePane::new(Board::remote(&view.stack), None, text)),
                versus(name, &view.name),
            )
        }
        None => (None, format!(" {name} ")),
    };
    MatchFrame::new(player, opponent_pane, caption).render(style)
}

#[cfg(test)]
mod tests {
    use tetris_core::Tetromino;

    use super::*;

    fn snapshot() -> GameSnapshot {
        let mut stack = [[None; COLS]; ROWS];
        stack[0][0] = Some(Shape::J);
        GameSnapshot {
            stack,
            current: None,
            next: Some(Tetromino::spawn(Shape::O)),
            level: 1,
            lines_cleared: 0,
            game_over: false,
        }
    }

    #[test]
    fn settled_cells_render_at_the_bottom_of_the_well() {
        let lines = playing_lines(&snapshot(), None, true, "tester", &PlainTermStyle);
        // 20 well rows, bottom border, blank line, caption
        assert_eq!(lines.len(), ROWS + 3);
        let floor = &lines[ROWS - 1];
        assert!(floor.starts_with("|[]"), "floor row: {floor:?}");
        assert!(lines[0].starts_with("|  "), "ceiling row: {:?}", lines[0]);
        assert!(lines[ROWS].starts_with("+--"));
    }

    #[test]
    fn ghost_cells_render_distinctly() {
        let mut s = snapshot();
        s.stack = [[None; COLS]; ROWS];
        let mut piece = Tetromino::spawn(Shape::J);
        piece.ghost_y = 1;
        s.current = Some(piece);
        let lines = playing_lines(&s, None, true, "tester", &PlainTermStyle);
        // ghost bottom row sits on the floor (y = 0), screen row 19
        assert!(lines[ROWS - 1].contains("::"), "{:?}", lines[ROWS - 1]);
        // the piece itself renders near the ceiling
        assert!(lines[0].contains("[]") || lines[1].contains("[]"));
    }

    #[test]
    fn noghost_suppresses_the_projection() {
        let mut s = snapshot();
        s.stack = [[None; COLS]; ROWS];
        let mut piece = Tetromino::spawn(Shape::J);
        piece.ghost_y = 1;
        s.current = Some(piece);
        let lines = playing_lines(&s, None, false, "tester", &PlainTermStyle);
        assert!(!lines.iter().any(|line| line.contains("::")));
    }

    #[test]
    fn online_frame_shows_both_boards_and_the_versus_caption() {
        let mut view = OpponentView::unknown();
        view.name = "opponent".to_string();
        view.stack[0][9] = Some(Shape::T);
        let lines = playing_lines(&snapshot(), Some(&view), true, "me", &PlainTermStyle);
        let caption = lines.last().expect("caption");
        assert!(caption.contains("vs"), "{caption:?}");
        assert!(caption.contains("me"));
        assert!(caption.contains("opponent"));
        // two wells: four vertical borders on a board row
        assert_eq!(lines[0].matches('|').count(), 4);
    }

    #[test]
    fn notice_boxes_are_uniform_width() {
        for notice in [
            Notice::Welcome,
            Notice::GameOver,
            Notice::YouWon,
            Notice::NoOpponent,
            Notice::Waiting,
            Notice::Error,
        ] {
            let lines = notice_box(notice);
            assert!(lines.len() >= 3);
            assert!(lines.iter().all(|l| l.chars().count() == BOX_WIDTH + 2));
        }
    }

    #[test]
    fn versus_caption_pads_and_clips_names() {
        let caption = versus("ab", "cd");
        assert_eq!(caption.chars().count(), 30);
        assert!(caption.contains("ab <- vs -> cd"));
        let long = versus("abcdefghijkl", "x");
        assert!(long.contains("abcdefghi"));
        assert!(!long.contains("abcdefghij"));
    }
}
