use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{ExecutableCommand, QueueableCommand};
use gakman::direction::cell_of;
use gakman::generate::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use gakman::{
    generate_layout, init_logging, Dir, GameError, GameEvent, GhostState, Level, Personality, Settings,
    SimConfig, Simulation,
};
use glam::{IVec2, Vec2};
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Stdout, Write};
use std::thread;
use std::time::{Duration, Instant};
use unicode_width::UnicodeWidthStr;

const CELL_W: usize = 2;
const INPUT_HOLD_MS: u64 = 160;

#[derive(Clone, Copy, PartialEq)]
enum Glyph {
    Player,
    Ghost,
    Frightened,
    Eyes,
    Wall,
    Empty,
    Pellet,
    Power,
    Gate,
}

#[derive(Clone, Copy, PartialEq)]
struct Cell {
    glyph: Glyph,
    color: Color,
}

const EMPTY: Cell = Cell {
    glyph: Glyph::Empty,
    color: Color::Reset,
};

struct Renderer {
    last: Vec<Cell>,
    last_hud: String,
    needs_full: bool,
    origin_x: u16,
    origin_y: u16,
}

impl Renderer {
    fn new(width: usize, height: usize) -> Self {
        Self {
            last: vec![EMPTY; width * height],
            last_hud: String::new(),
            needs_full: true,
            origin_x: 0,
            origin_y: 1,
        }
    }
}

/// Everything that outlives a single level.
struct Session {
    settings: Settings,
    rng: StdRng,
    sim: Simulation,
    size: IVec2,
    level: u32,
    banked_score: u32,
}

impl Session {
    fn start(settings: Settings) -> Result<Self, GameError> {
        let seed = settings.seed.unwrap_or_else(|| rand::thread_rng().gen());
        info!("starting with seed {seed}");
        let mut rng = StdRng::seed_from_u64(seed);
        let level = load_level(&settings, &mut rng)?;
        let sim_seed = rng.gen();
        Ok(Self {
            size: level.size,
            sim: Simulation::from_level(&level, SimConfig::default(), sim_seed),
            settings,
            rng,
            level: 1,
            banked_score: 0,
        })
    }

    fn next_level(&mut self) -> Result<(), GameError> {
        let level = load_level(&self.settings, &mut self.rng)?;
        let config = SimConfig {
            lives: self.sim.lives(),
            ..SimConfig::default()
        };
        self.banked_score += self.sim.score();
        self.size = level.size;
        self.sim = Simulation::from_level(&level, config, self.rng.gen());
        self.level += 1;
        info!("level {} with {} lives", self.level, self.sim.lives());
        Ok(())
    }

    fn score(&self) -> u32 {
        self.banked_score + self.sim.score()
    }

    fn width(&self) -> usize {
        self.size.x as usize
    }

    fn height(&self) -> usize {
        self.size.y as usize
    }
}

fn load_level(settings: &Settings, rng: &mut StdRng) -> Result<Level, GameError> {
    match &settings.layout {
        Some(path) => Level::load(path),
        None => Ok(Level::from_rows(&generate_layout(rng, DEFAULT_WIDTH, DEFAULT_HEIGHT))?),
    }
}

fn main() -> Result<(), GameError> {
    let settings = Settings::from_env();
    let sink = settings.log_file.as_ref().map(File::create).transpose()?;
    init_logging(settings.verbose, sink);

    let mut session = Session::start(settings)?;

    let mut stdout = io::stdout();
    terminal::enable_raw_mode()?;
    stdout.execute(EnterAlternateScreen)?;
    stdout.execute(Hide)?;

    let result = run(&mut stdout, &mut session);

    stdout.execute(Show)?;
    stdout.execute(LeaveAlternateScreen)?;
    terminal::disable_raw_mode()?;
    result
}

fn run(stdout: &mut Stdout, session: &mut Session) -> Result<(), GameError> {
    let mut last_tick = Instant::now();
    let mut last_seen: [Option<Instant>; 4] = [None; 4];
    let mut last_pressed: Option<Dir> = None;
    let mut renderer = Renderer::new(session.width(), session.height());
    let tick_every = Duration::from_millis(session.settings.tick_ms);
    let frame_time = Duration::from_micros(1_000_000 / session.settings.render_fps.max(1));

    loop {
        let frame_start = Instant::now();
        while event::poll(Duration::from_millis(0))? {
            let Event::Key(key) = event::read()? else {
                continue;
            };
            if !matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) {
                continue;
            }
            let dir = match key.code {
                KeyCode::Char('q') => return Ok(()),
                KeyCode::Char('k') | KeyCode::Up => Dir::Up,
                KeyCode::Char('j') | KeyCode::Down => Dir::Down,
                KeyCode::Char('h') | KeyCode::Left => Dir::Left,
                KeyCode::Char('l') | KeyCode::Right => Dir::Right,
                _ => continue,
            };
            last_seen[dir as usize] = Some(Instant::now());
            last_pressed = Some(dir);
        }

        if last_tick.elapsed() >= tick_every {
            last_tick = Instant::now();
            let raw = active_dir_recent(&last_seen, last_pressed)
                .map_or(Vec2::ZERO, |dir| dir.delta().as_vec2());
            let dt = session.settings.tick_secs();
            let events = session.sim.tick(raw, dt);
            if events.contains(&GameEvent::LevelCleared) {
                session.next_level()?;
                renderer = Renderer::new(session.width(), session.height());
            }
            render(stdout, session, &mut renderer)?;
            if session.sim.lives() == 0 {
                render_game_over(stdout, session)?;
                return Ok(());
            }
        } else {
            render(stdout, session, &mut renderer)?;
        }

        let elapsed = frame_start.elapsed();
        if elapsed < frame_time {
            thread::sleep(frame_time - elapsed);
        }
    }
}

/// Where the board's top-left corner goes on screen, or the board size when
/// the terminal is too small to hold it.
fn board_origin(session: &Session) -> io::Result<Result<(u16, u16), (u16, u16)>> {
    let needed = ((session.width() * CELL_W) as u16, (session.height() + 2) as u16);
    let (term_w, term_h) = terminal::size()?;
    if term_w < needed.0 || term_h < needed.1 {
        return Ok(Err(needed));
    }
    Ok(Ok(((term_w - needed.0) / 2, (term_h - needed.1) / 2 + 1)))
}

fn render(stdout: &mut Stdout, session: &Session, renderer: &mut Renderer) -> io::Result<()> {
    let (width, height) = (session.width(), session.height());
    stdout.queue(MoveTo(0, 0))?;

    let (origin_x, origin_y) = match board_origin(session)? {
        Ok(origin) => origin,
        Err((needed_w, needed_h)) => {
            let (term_w, term_h) = terminal::size()?;
            stdout.queue(Clear(ClearType::All))?;
            stdout.queue(Print(format!(
                "Terminal too small: need {needed_w}x{needed_h}, have {term_w}x{term_h}."
            )))?;
            stdout.flush()?;
            renderer.needs_full = true;
            return Ok(());
        }
    };
    if (origin_x, origin_y) != (renderer.origin_x, renderer.origin_y) {
        renderer.origin_x = origin_x;
        renderer.origin_y = origin_y;
        renderer.needs_full = true;
    }

    let sim = &session.sim;
    let hud = format!(
        "Score: {}  Lives: {}  Level: {}  Pellets: {}  {}  (q to quit)",
        session.score(),
        sim.lives(),
        session.level,
        sim.pellets().len() + sim.power_pellets().len(),
        if sim.scatter_mode() { "Scatter" } else { "Chase" },
    );
    if renderer.needs_full || hud != renderer.last_hud {
        stdout.queue(MoveTo(renderer.origin_x, renderer.origin_y - 1))?;
        stdout.queue(SetForegroundColor(Color::White))?;
        stdout.queue(Clear(ClearType::CurrentLine))?;
        stdout.queue(Print(&hud))?;
        stdout.queue(ResetColor)?;
        renderer.last_hud = hud;
    }

    let actors = actor_cells(sim);
    for row in 0..height {
        for x in 0..width {
            // World rows grow upward, screen rows downward.
            let cell = IVec2::new(x as i32, (height - 1 - row) as i32);
            let drawn = actors.get(&cell).copied().unwrap_or_else(|| static_cell(sim, cell));
            let idx = row * width + x;
            if renderer.needs_full || drawn != renderer.last[idx] {
                renderer.last[idx] = drawn;
                draw_cell(stdout, renderer, x, row, drawn)?;
            }
        }
    }
    renderer.needs_full = false;

    stdout.flush()?;
    Ok(())
}

// Players are inserted last so they stay visible on top of ghosts.
fn actor_cells(sim: &Simulation) -> HashMap<IVec2, Cell> {
    let mut cells = HashMap::new();
    let snapshots = sim.snapshots();
    for snapshot in &snapshots {
        let Some((personality, state)) = snapshot.ghost else {
            continue;
        };
        let cell = match state {
            GhostState::Scared => Cell {
                glyph: Glyph::Frightened,
                color: Color::Blue,
            },
            GhostState::Eaten => Cell {
                glyph: Glyph::Eyes,
                color: Color::White,
            },
            _ => Cell {
                glyph: Glyph::Ghost,
                color: ghost_color(personality),
            },
        };
        cells.insert(cell_of(snapshot.position), cell);
    }
    for snapshot in snapshots.iter().filter(|s| s.ghost.is_none()) {
        cells.insert(
            cell_of(snapshot.position),
            Cell {
                glyph: Glyph::Player,
                color: Color::Yellow,
            },
        );
    }
    cells
}

fn static_cell(sim: &Simulation, cell: IVec2) -> Cell {
    let maze = sim.maze();
    if maze.has_wall(cell, false, false) {
        Cell {
            glyph: Glyph::Wall,
            color: Color::Blue,
        }
    } else if maze.has_wall(cell, true, false) {
        Cell {
            glyph: Glyph::Gate,
            color: Color::Cyan,
        }
    } else if sim.power_pellets().contains(&cell) {
        Cell {
            glyph: Glyph::Power,
            color: Color::Magenta,
        }
    } else if sim.pellets().contains(&cell) {
        Cell {
            glyph: Glyph::Pellet,
            color: Color::White,
        }
    } else {
        EMPTY
    }
}

fn ghost_color(personality: Personality) -> Color {
    match personality {
        Personality::Red => Color::Red,
        Personality::Pink => Color::Magenta,
        Personality::Cyan => Color::Cyan,
        Personality::Orange => Color::DarkYellow,
        Personality::Green => Color::Green,
        Personality::Purple => Color::DarkMagenta,
        Personality::Yellow => Color::Yellow,
        Personality::White => Color::White,
        Personality::Custom => Color::Grey,
    }
}

fn draw_cell(stdout: &mut Stdout, renderer: &Renderer, x: usize, y: usize, cell: Cell) -> io::Result<()> {
    let text = match cell.glyph {
        Glyph::Player => "😃",
        Glyph::Ghost => "👻",
        Glyph::Frightened => "😱",
        Glyph::Eyes => "👀",
        Glyph::Wall => "██",
        Glyph::Empty => "  ",
        Glyph::Pellet => "· ",
        Glyph::Power => "● ",
        Glyph::Gate => "==",
    };
    let x_pos = renderer.origin_x + (x * CELL_W) as u16;
    let y_pos = renderer.origin_y + y as u16;
    stdout.queue(MoveTo(x_pos, y_pos))?;
    stdout.queue(SetForegroundColor(cell.color))?;
    stdout.queue(Print(text))?;
    let w = UnicodeWidthStr::width(text);
    for _ in w..CELL_W {
        stdout.queue(Print(' '))?;
    }
    stdout.queue(ResetColor)?;
    Ok(())
}

fn render_game_over(stdout: &mut Stdout, session: &Session) -> io::Result<()> {
    let below_board = match board_origin(session)? {
        Ok((x, y)) => MoveTo(x, y + session.height() as u16),
        Err((_, needed_h)) => MoveTo(0, needed_h),
    };
    stdout.queue(below_board)?;
    stdout.queue(Print(format!(
        "GAME OVER after level {}. Final score: {} (q quits)",
        session.level,
        session.score()
    )))?;
    stdout.flush()?;
    loop {
        if !event::poll(Duration::from_millis(50))? {
            continue;
        }
        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press && key.code == KeyCode::Char('q') {
                return Ok(());
            }
        }
    }
}

/// The most recently seen direction key that is still inside the hold
/// window. Terminals report repeats rather than releases, so a key counts as
/// held until its repeats stop arriving.
fn active_dir_recent(last_seen: &[Option<Instant>; 4], last_pressed: Option<Dir>) -> Option<Dir> {
    let now = Instant::now();
    let hold = Duration::from_millis(INPUT_HOLD_MS);
    let fresh = |dir: Dir| last_seen[dir as usize].filter(|t| now.duration_since(*t) <= hold);

    if let Some(dir) = last_pressed {
        if fresh(dir).is_some() {
            return Some(dir);
        }
    }
    Dir::ALL
        .into_iter()
        .filter_map(|dir| fresh(dir).map(|t| (dir, t)))
        .max_by_key(|(_, t)| *t)
        .map(|(dir, _)| dir)
}
