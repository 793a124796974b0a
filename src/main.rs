//! Markups-Editor Demo.
//!
//! Spielt eine kurze Ereignisfolge (Platzieren, Ziehen, Rotieren, Löschen)
//! über den `DisplayableManager` einer 3D-Ansicht ab und protokolliert das
//! Ergebnis.

use anyhow::Context;
use glam::{DVec2, DVec3};
use markups_editor::{
    Camera, DisplayableManager, InteractionEvent, Key, MarkupsKind, MarkupsNode, MarkupsOptions,
    Modifiers, MouseButton, View, Viewport,
};

fn main() -> anyhow::Result<()> {
    DemoRunner::run()
}

struct DemoRunner {
    manager: DisplayableManager,
    nodes: Vec<MarkupsNode>,
}

impl DemoRunner {
    fn run() -> anyhow::Result<()> {
        // Logger initialisieren
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();

        log::info!("Markups-Editor v{} startet...", env!("CARGO_PKG_VERSION"));

        // Optionen aus TOML laden (oder Standardwerte)
        let config_path = MarkupsOptions::config_path();
        let options = MarkupsOptions::load_from_file(&config_path);

        let view = View::new_3d(
            "View1",
            Camera::looking_at(DVec3::ZERO, 300.0),
            Viewport::new(800.0, 600.0),
        );
        let mut runner = Self {
            manager: DisplayableManager::new(view, options),
            nodes: vec![MarkupsNode::new("Curve1", MarkupsKind::Curve)],
        };
        anyhow::ensure!(
            runner.manager.add_node(&mut runner.nodes[0]),
            "Node '{}' ist in der Ansicht nicht darstellbar",
            runner.nodes[0].id()
        );

        runner.place(&[
            DVec2::new(250.0, 300.0),
            DVec2::new(350.0, 200.0),
            DVec2::new(450.0, 350.0),
            DVec2::new(550.0, 250.0),
        ])?;
        runner.log_points("Nach dem Platzieren");

        runner.drag_point(1, DVec2::new(0.0, -40.0), Modifiers::NONE, MouseButton::Left)?;
        runner.log_points("Nach dem Ziehen von Punkt 1");

        runner.drag_point(3, DVec2::new(-60.0, 60.0), Modifiers::ALT, MouseButton::Left)?;
        runner.log_points("Nach der Rotation");

        let position = runner.display_of(2)?;
        runner.send(InteractionEvent::mouse_move(position));
        runner.send(InteractionEvent::key(Key::Delete, position));
        runner.log_points("Nach dem Löschen von Punkt 2");

        for (node_id, notification) in runner.manager.take_notifications() {
            log::info!("{}: {:?}", node_id, notification);
        }

        let geometry = runner
            .manager
            .build_representation(&mut runner.nodes[0])
            .context("Widget für Curve1 fehlt")?;
        let length: f64 = geometry
            .line_world
            .windows(2)
            .map(|pair| pair[0].distance(pair[1]))
            .sum();
        log::info!(
            "Kurve: {} Stützpunkte, Länge {:.2}",
            geometry.line_world.len(),
            length
        );
        Ok(())
    }

    fn send(&mut self, event: InteractionEvent) -> bool {
        self.manager
            .process_interaction_event(&mut self.nodes, &event)
    }

    /// Platziert Punkte an den Display-Positionen und beendet die Platzierung.
    fn place(&mut self, positions: &[DVec2]) -> anyhow::Result<()> {
        self.manager
            .widget_mut(&self.nodes[0])
            .context("Widget für Curve1 fehlt")?
            .start_placement(&self.nodes[0]);
        for &position in positions {
            self.send(InteractionEvent::mouse_move(position));
            self.send(InteractionEvent::press(MouseButton::Left, position));
        }
        let widget = self
            .manager
            .widget_mut(&self.nodes[0])
            .context("Widget für Curve1 fehlt")?;
        widget.finish_placement(&mut self.nodes[0]);
        Ok(())
    }

    /// Greift Punkt `index` und zieht um `delta` Pixel.
    fn drag_point(
        &mut self,
        index: usize,
        delta: DVec2,
        modifiers: Modifiers,
        button: MouseButton,
    ) -> anyhow::Result<()> {
        let start = self.display_of(index)?;
        self.send(InteractionEvent::mouse_move(start));
        let grabbed = self.send(InteractionEvent::press(button, start).with_modifiers(modifiers));
        if !grabbed {
            log::warn!("Punkt {} konnte nicht gegriffen werden", index);
            return Ok(());
        }
        for step in 1..=4 {
            let position = start + delta * (f64::from(step) / 4.0);
            self.send(InteractionEvent::mouse_move(position));
        }
        self.send(InteractionEvent::release(button, start + delta));
        Ok(())
    }

    fn display_of(&self, index: usize) -> anyhow::Result<DVec2> {
        let world = self.nodes[0]
            .nth_position_world(index)
            .with_context(|| format!("Punkt {} existiert nicht", index))?;
        Ok(self.manager.view().world_to_display(world).truncate())
    }

    fn log_points(&self, title: &str) {
        log::info!("{}:", title);
        for (index, world) in self.nodes[0].positions_world().iter().enumerate() {
            log::info!("  [{}] ({:.2}, {:.2}, {:.2})", index, world.x, world.y, world.z);
        }
    }
}
