//! Interactive check of the standard stamp set.
//! Type touch coordinates, or place a named stamp at an angle, and see what
//! the matcher recognises.

use constellation::{
    standard_layout, standard_library, standard_names, MatcherConfig, PatternLibrary, Point,
    TouchPoint, DEFAULT_STUD_SPACING,
};
use std::io::{self, Write};

fn main() {
    println!();
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║            Stamp Constellation Probe                 ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    let mut lib = match standard_library(DEFAULT_STUD_SPACING, MatcherConfig::default()) {
        Ok(lib) => lib,
        Err(e) => {
            eprintln!("  ⚠  could not build the standard stamp set: {e}");
            return;
        }
    };

    loop {
        print_menu(&lib);
        let choice = read_line("Select (1–3, or q to quit): ");

        match choice.trim() {
            "q" | "Q" => { println!("\nGoodbye!\n"); break; }
            "1" => place_stamp(&lib),
            "2" => raw_touches(&lib),
            "3" => {
                let t = read_line("  Tolerance (default 30): ").trim().parse().unwrap_or(30.0);
                lib.set_tolerance(f64::max(t, 0.0));
                println!("  Tolerance now {:.1}\n", lib.config().tolerance);
            }
            _ => println!("  ⚠  Please enter 1–3 or q.\n"),
        }
    }
}

fn print_menu(lib: &PatternLibrary) {
    println!("  ┌──────────────────────────────────────────────────────┐");
    println!("  │  1. Place a standard stamp                           │");
    println!("  │  2. Enter raw touches (x,y x,y …)                    │");
    println!("  │  3. Change tolerance (now {:6.1})                    │", lib.config().tolerance);
    println!("  └──────────────────────────────────────────────────────┘");
    println!();
}

fn place_stamp(lib: &PatternLibrary) {
    let names: Vec<&str> = standard_names().collect();
    println!("  Stamps: {}", names.join(", "));
    let name = read_line("  Name: ").trim().to_ascii_uppercase();
    let Some(layout) = standard_layout(&name, DEFAULT_STUD_SPACING) else {
        println!("  ⚠  No stamp called {name}.\n");
        return;
    };
    let degrees: f64 = read_line("  Rotation in degrees (default 0): ")
        .trim()
        .parse()
        .unwrap_or(0.0);
    let mirror = read_line("  Mirror it? (y/N): ").trim().eq_ignore_ascii_case("y");

    let touches = transform(&layout, degrees.to_radians(), mirror, Point::new(400.0, 300.0));
    report(lib, &touches);
}

fn raw_touches(lib: &PatternLibrary) {
    let line = read_line("  Touches: ");
    let mut touches = Vec::new();
    for (i, tok) in line.split_whitespace().enumerate() {
        let parsed = tok
            .split_once(',')
            .and_then(|(x, y)| Some((x.parse::<f64>().ok()?, y.parse::<f64>().ok()?)));
        match parsed {
            Some((x, y)) => touches.push(TouchPoint::new(i as u64, x, y)),
            None => { println!("  ⚠  '{tok}' is not x,y\n"); return; }
        }
    }
    report(lib, &touches);
}

fn transform(layout: &[Point], theta: f64, mirror: bool, at: Point) -> Vec<TouchPoint> {
    let c = constellation::centroid(layout);
    let (s, co) = theta.sin_cos();
    layout
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let dx = if mirror { c.x - p.x } else { p.x - c.x };
            let dy = p.y - c.y;
            TouchPoint::new(i as u64, at.x + dx * co - dy * s, at.y + dx * s + dy * co)
        })
        .collect()
}

fn report(lib: &PatternLibrary, touches: &[TouchPoint]) {
    println!();
    println!("  ┌─ {} touches ─", touches.len());
    for t in touches {
        println!("  │  #{:<3} ({:8.2}, {:8.2})", t.id, t.x, t.y);
    }
    println!("  │");
    let found = lib.recognize(touches);
    if found.is_empty() {
        println!("  │  no stamp recognised");
    }
    for c in &found {
        println!(
            "  │  {:<12} {:<6}  centre ({:7.1}, {:7.1})  rotation {:7.2}°",
            c.template_name,
            c.category,
            c.center.x,
            c.center.y,
            c.rotation.to_degrees()
        );
    }
    println!("  └─ ({} recognised)", found.len());
    println!();
}

fn read_line(prompt: &str) -> String {
    print!("{}", prompt);
    io::stdout().flush().ok();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf
}
