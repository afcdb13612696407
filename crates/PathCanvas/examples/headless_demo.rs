use path_canvas::edit_mode::EditMode;
use path_canvas::input::{InputEvent, Key, Modifiers};
use path_canvas::persistence::MemoryStorage;
use path_canvas::sync::MemorySink;
use path_canvas::{CanvasConfig, DVec2, Editor};

fn click(editor: &mut Editor, x: f64, y: f64) {
    let p = DVec2::new(x, y);
    for event in [InputEvent::press(p), InputEvent::release(p)] {
        for logic in editor.handle(event) {
            println!("  event: {logic:?}");
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("=== PathCanvas Headless Demo ===");

    // 1. Initialize Editor with an in-memory outbox instead of a server
    let sink = MemorySink::default();
    let mut editor = Editor::with_sink(CanvasConfig::default(), sink.clone());

    // 2. Drop three stations
    editor.set_mode(EditMode::AddNode);
    for (x, y) in [(100.0, 100.0), (300.0, 100.0), (300.0, 300.0)] {
        click(&mut editor, x, y);
    }

    // 3. Connect them
    editor.set_mode(EditMode::AddPath);
    click(&mut editor, 100.0, 100.0);
    click(&mut editor, 300.0, 100.0);
    click(&mut editor, 300.0, 100.0);
    click(&mut editor, 300.0, 300.0);

    // 4. Drag the first station, then undo the drag
    editor.set_mode(EditMode::Select);
    editor.handle(InputEvent::press(DVec2::new(100.0, 100.0)));
    editor.handle(InputEvent::PointerMove {
        position: DVec2::new(150.0, 180.0),
    });
    editor.handle(InputEvent::release(DVec2::new(150.0, 180.0)));
    editor.handle(InputEvent::KeyDown {
        key: Key::Z,
        modifiers: Modifiers::CTRL,
    });

    // 5. Zoom in around the middle station
    editor.handle(InputEvent::Wheel {
        position: DVec2::new(300.0, 100.0),
        delta_y: -1.0,
    });

    println!(
        "Graph: {} nodes, {} paths, viewport {:?}",
        editor.store().node_count(),
        editor.store().path_count(),
        editor.viewport()
    );
    for envelope in sink.take() {
        println!("  outbox #{}: {}", envelope.seq, envelope.request.op());
    }

    // 6. Persist locally
    let storage = MemoryStorage::default();
    match editor.save_to(&storage) {
        Ok(()) => println!("Saved. Dirty: {}", editor.is_dirty()),
        Err(e) => eprintln!("Save failed: {e}"),
    }
}
