use clap::{Parser, Subcommand};
use orbis::config::{self, Config};
use orbis::events::AppEvent;
use orbis::geometry::{Point, Viewport};
use orbis::layout::{ItemId, ItemSpec, LayoutController, SolverKind};
use orbis::sys::server::SOCKET_PATH;
use std::io::Write;
use std::os::unix::net::UnixStream;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "orbisctl", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
enum Commands {
    /// Open the orbit
    Show,
    /// Close the orbit
    Hide,
    /// Click the anchor (toggles open/closed)
    Click,
    /// Begin dragging the anchor from a pointer position
    DragStart { x: f64, y: f64 },
    /// Move the pointer while dragging
    Drag { x: f64, y: f64 },
    /// Release the anchor
    DragEnd { x: f64, y: f64 },
    /// Hover an item
    Hover { id: String },
    /// Stop hovering an item
    Unhover { id: String },
    /// Report a new viewport size
    Resize { width: f64, height: f64 },
    /// Ask the daemon to print its current layout
    Dump,
    /// Ask the daemon to reload its configuration
    Reload,
    /// Write the default config file if none exists
    Init,
    /// Solve a layout locally and print it as JSON
    Solve(SolveArgs),
}

#[derive(clap::Args, Debug, Clone)]
struct SolveArgs {
    /// Placement strategy (defaults to the configured one)
    #[arg(short, long)]
    solver: Option<SolverKind>,

    #[arg(long)]
    width: Option<f64>,

    #[arg(long)]
    height: Option<f64>,

    /// Anchor center; defaults to the viewport center
    #[arg(long, requires = "anchor_y")]
    anchor_x: Option<f64>,

    #[arg(long, requires = "anchor_x")]
    anchor_y: Option<f64>,

    /// Replace the configured items with this many generated ones
    #[arg(short = 'n', long)]
    count: Option<usize>,

    /// Item to render hovered
    #[arg(long)]
    hover: Option<String>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let event = match cli.command {
        Commands::Show => AppEvent::Show,
        Commands::Hide => AppEvent::Hide,
        Commands::Click => AppEvent::Click,
        Commands::DragStart { x, y } => AppEvent::DragStart(Point::new(x, y)),
        Commands::Drag { x, y } => AppEvent::DragMove(Point::new(x, y)),
        Commands::DragEnd { x, y } => AppEvent::DragEnd(Point::new(x, y)),
        Commands::Hover { id } => AppEvent::HoverEnter(ItemId::new(id)),
        Commands::Unhover { id } => AppEvent::HoverLeave(ItemId::new(id)),
        Commands::Resize { width, height } => AppEvent::Resize(Viewport::new(width, height)),
        Commands::Dump => AppEvent::Dump,
        Commands::Reload => AppEvent::ConfigReload,
        Commands::Init => {
            let path = config::write_default_config()?;
            println!("{}", path.display());
            return Ok(());
        }
        Commands::Solve(args) => return solve(args),
    };

    send_event(&event)
}

fn solve(args: SolveArgs) -> anyhow::Result<()> {
    let mut config: Config = config::load_or_default();
    if let Some(solver) = args.solver {
        config.solver = solver;
    }
    config.viewport = Viewport::new(
        args.width.unwrap_or(config.viewport.width),
        args.height.unwrap_or(config.viewport.height),
    );

    let mut controller = LayoutController::new(&config);

    if let Some(count) = args.count {
        let specs = (0..count)
            .map(|i| ItemSpec::new(format!("item-{i}"), config.layout.item_size))
            .collect();
        controller.set_items(specs);
    }

    if let (Some(x), Some(y)) = (args.anchor_x, args.anchor_y) {
        // replay a drag from the current center to the requested one
        controller.drag_start(controller.anchor().center());
        controller.drag_end(Point::new(x, y));
    }

    controller.set_open(true);

    if let Some(id) = args.hover {
        let now = Instant::now();
        controller.hover_enter(ItemId::new(id.clone()), now);
        // skip the hover-intent delay
        controller.poll(now + config.interaction.hover_enter_delay());
        if controller.hovered().is_none() {
            anyhow::bail!("No item with id '{}'", id);
        }
    }

    println!("{}", serde_json::to_string_pretty(&controller.snapshot())?);
    Ok(())
}

fn send_event(event: &AppEvent) -> anyhow::Result<()> {
    let mut stream = UnixStream::connect(SOCKET_PATH).map_err(|e| {
        anyhow::anyhow!(
            "Failed to connect to orbis daemon at {}: {}. Is orbis running?",
            SOCKET_PATH,
            e
        )
    })?;

    writeln!(stream, "{}", event)?;
    log::debug!("Sent '{}'", event);
    Ok(())
}
