use path_canvas::edit_mode::EditMode;
use path_canvas::input::InputEvent;
use path_canvas::{CanvasConfig, DVec2};
use pathcanvas_bridge::{BridgeConfig, EditorBridge, LayoutAlgorithm};
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    println!("=== PathCanvas Bridge Demo ===");

    // 1. Connect to the API (PATH_EDITOR_API_URL, default localhost:8080)
    let config = BridgeConfig::from_env();
    println!("Using API at {}", config.api_url);
    let bridge = EditorBridge::spawn(config)?;
    let mut editor = bridge.editor(CanvasConfig::default());

    // 2. Load whatever the server already has
    bridge.seed(&mut editor).await?;
    println!(
        "Seeded {} nodes and {} paths.",
        editor.store().node_count(),
        editor.store().path_count()
    );

    // 3. Drop two stations and connect them; each edit is posted in the background
    editor.set_mode(EditMode::AddNode);
    for p in [DVec2::new(600.0, 100.0), DVec2::new(800.0, 100.0)] {
        editor.handle(InputEvent::press(p));
        editor.handle(InputEvent::release(p));
    }
    editor.set_mode(EditMode::AddPath);
    for p in [DVec2::new(600.0, 100.0), DVec2::new(800.0, 100.0)] {
        editor.handle(InputEvent::press(p));
        editor.handle(InputEvent::release(p));
    }

    // 4. Let the worker settle, as a frame loop would
    for _ in 0..10 {
        bridge.sync_outcomes(&mut editor);
        if editor.ledger().pending() == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    for note in editor.take_notifications() {
        println!("  [{:?}] {}", note.level, note.message);
    }

    // 5. Ask the server for a grid layout
    bridge.apply_layout(&mut editor, LayoutAlgorithm::Grid).await?;
    for node in editor.store().nodes() {
        println!("  {} at ({:.0}, {:.0})", node.name, node.position.x, node.position.y);
    }

    bridge.shutdown().await;
    println!("Done.");
    Ok(())
}
