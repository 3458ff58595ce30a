//! Example: Convert an An8 file and inspect the resulting scene.
//!
//! Run with: cargo run --example convert_an8 -- walker.an8 [options.json] [--json]

use std::env;

use anyhow::Context;

use an8_core::an8::{load_an8, load_options};
use an8_core::ConvertOptions;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        println!("Usage: convert_an8 <path-to-an8-file> [options.json] [--json]");
        println!("\nExamples:");
        println!("  cargo run --example convert_an8 -- walker.an8");
        println!("  cargo run --example convert_an8 -- walker.an8 options.json --json");
        return Ok(());
    }

    let dump_json = args.iter().any(|a| a == "--json");
    let options = match args.iter().skip(2).find(|a| !a.starts_with("--")) {
        Some(path) => load_options(path).with_context(|| format!("reading options from {}", path))?,
        None => ConvertOptions::default(),
    };

    let path = &args[1];
    println!("Converting An8 file: {}", path);
    let scene = load_an8(path, &options).with_context(|| format!("converting {}", path))?;

    println!("\n=== Scene: {} ===", scene.name);
    println!("Nodes: {}", scene.graph.len());
    println!("Geometries: {}", scene.geometries.len());
    println!("Materials: {}", scene.materials.len());
    println!("Controllers: {}", scene.controllers.len());
    println!("Animations: {} at {} fps", scene.animations.len(), scene.frames_per_second);
    println!("Total polygons: {}", scene.total_polygon_count());

    println!("\n--- Nodes ---");
    for id in scene.graph.depth_first() {
        let node = scene.graph.node(id);
        let depth = scene.graph.ancestors(id).count();
        let position = scene.graph.bind_matrix(id).translation();
        println!(
            "  {:indent$}{} ({:?}) at ({:.2}, {:.2}, {:.2})",
            "",
            node.name,
            node.kind,
            position.x,
            position.y,
            position.z,
            indent = depth * 2
        );
        if let Some(geometry) = scene.geometry_of(id) {
            println!(
                "  {:indent$}  {} points, {} polygons in {} groups",
                "",
                geometry.points.len(),
                geometry.polygon_count(),
                geometry.groups.len(),
                indent = depth * 2
            );
        }
    }

    println!("\n--- Animations ---");
    for animation in &scene.animations {
        println!(
            "  {} ({}): {} channels, {} samples",
            animation.name,
            animation.figure,
            animation.channels.len(),
            animation.sample_count()
        );
    }

    if dump_json {
        println!("\n{}", scene.to_json()?);
    }

    Ok(())
}
