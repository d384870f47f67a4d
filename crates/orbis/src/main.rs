use async_channel::Receiver;
use orbis::config;
use orbis::events::AppEvent;
use orbis::layout::{LayoutController, Reaction};
use orbis::sys::runtime;
use std::io::Write;
use std::time::Instant;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = config::load_or_default();
    let controller = LayoutController::new(&config);

    let (tx, rx) = async_channel::bounded(32);

    // Start Background Services
    runtime::start_background_services(tx);

    // the controller lives on this thread only; recomputes are serialized by the loop
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    rt.block_on(run_layout_loop(controller, rx))
}

async fn run_layout_loop(
    mut controller: LayoutController,
    rx: Receiver<AppEvent>,
) -> anyhow::Result<()> {
    emit(&controller)?;

    loop {
        let received = match controller.next_deadline() {
            Some(deadline) => tokio::select! {
                event = rx.recv() => event,
                _ = tokio::time::sleep_until(deadline.into()) => {
                    if controller.poll(Instant::now()).should_redraw {
                        emit(&controller)?;
                    }
                    continue;
                }
            },
            None => rx.recv().await,
        };

        let Ok(event) = received else {
            break;
        };
        log::debug!("Event: {}", event);

        if handle(&mut controller, event).should_redraw {
            emit(&controller)?;
        }
    }

    Ok(())
}

fn handle(controller: &mut LayoutController, event: AppEvent) -> Reaction {
    let now = Instant::now();
    match event {
        AppEvent::Show => controller.set_open(true),
        AppEvent::Hide => controller.set_open(false),
        AppEvent::Click => controller.click(),
        AppEvent::DragStart(p) => controller.drag_start(p),
        AppEvent::DragMove(p) => controller.drag_move(p),
        AppEvent::DragEnd(p) => controller.drag_end(p),
        AppEvent::HoverEnter(id) => controller.hover_enter(id, now),
        AppEvent::HoverLeave(id) => controller.hover_leave(&id, now),
        AppEvent::Resize(viewport) => controller.resize(viewport),
        AppEvent::Dump => Reaction::new(false, true),
        AppEvent::ConfigReload => match config::load_config() {
            Ok(new_config) => {
                log::info!("Configuration reloaded");
                controller.reconfigure(&new_config.or_fallback_items())
            }
            Err(e) => {
                log::error!("Failed to reload config: {}", e);
                Reaction::default()
            }
        },
    }
}

/// Writes the current layout as one JSON line on stdout.
fn emit(controller: &LayoutController) -> anyhow::Result<()> {
    let mut out = std::io::stdout().lock();
    serde_json::to_writer(&mut out, &controller.snapshot())?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}
