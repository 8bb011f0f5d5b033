//! Homeward CLI - Command line interface for walk simulation.

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use homeward_core::{SessionRecord, TrailPacker};
use homeward_sim::runner::{compute_metrics, run_engine, RunConfig, RunResult};
use homeward_sim::sensor::{generate_sensor_stream, SensorConfig, SensorStream};
use homeward_sim::walk::{synthesize_walk, WalkLeg, WalkParams, WalkTruth};
use homeward_sim::{apply_engine_param, param_spec, SWEEPABLE};
use std::path::PathBuf;

/// Public function that can be called from the main binary
pub fn run_cli_main(args: &[&str]) -> Result<()> {
    let args = Args::parse_from(args);
    main_inner(args)
}

#[derive(Parser, Debug)]
#[command(name = "homeward-cli")]
#[command(about = "Pedestrian dead-reckoning simulator")]
#[command(version)]
pub struct Args {
    /// Output directory
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,

    /// Output file format
    #[arg(short, long, value_enum, default_value = "csv")]
    format: OutputFormat,

    // ── Walk script ───────────────────────────────────────────
    /// Legs as HEADING:METERS or HEADING:METERS:PITCH
    #[arg(long, value_delimiter = ' ', default_values = ["0:20", "90:10", "180:20", "270:10"])]
    legs: Vec<String>,

    #[arg(long, default_value_t = 1.4)]
    speed: f32,

    #[arg(long, default_value_t = 0.75)]
    true_step_length: f32,

    #[arg(long, default_value_t = 3.5)]
    accel_amp: f32,

    #[arg(long, default_value_t = 2.0)]
    idle_secs: f32,

    // ── Sensor options ────────────────────────────────────────
    #[arg(long, default_value_t = 42)]
    seed: u64,

    #[arg(long, default_value_t = 1.0)]
    noise_scale: f32,

    #[arg(long, default_value_t = 0.05)]
    heading_dropout: f32,

    // ── Engine options ────────────────────────────────────────
    #[arg(long, default_value_t = 0.75)]
    step_length: f32,

    #[arg(long, default_value_t = 0.15)]
    heading_alpha: f32,

    #[arg(long, default_value_t = 0.15)]
    pitch_alpha: f32,

    /// Resume from a previously written session.json
    #[arg(long)]
    resume_from: Option<PathBuf>,

    /// Run a step-length calibration window of this many seconds
    #[arg(long)]
    calibrate_secs: Option<u32>,

    // ── Sweep options ─────────────────────────────────────────
    /// Sweep one engine parameter across its range
    #[arg(long)]
    sweep_param: Option<String>,

    #[arg(long, default_value_t = 5)]
    sweep_steps: usize,

    // ── Tune mode ─────────────────────────────────────────────
    /// Greedy coordinate descent over the tune parameters
    #[arg(long)]
    tune: bool,

    #[arg(long, value_delimiter = ' ', default_values = ["step_length", "heading_alpha", "threshold_margin"])]
    tune_params: Vec<String>,

    #[arg(long, default_value_t = 2)]
    tune_rounds: usize,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

fn main_inner(args: Args) -> Result<()> {
    println!("Homeward Dead-Reckoning Simulator");
    println!("=================================\n");

    if args.tune {
        run_tune(&args)?;
    } else if args.sweep_param.is_some() {
        run_sweep(&args)?;
    } else {
        run_single(&args)?;
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Single Run
// ---------------------------------------------------------------------------
fn run_single(args: &Args) -> Result<()> {
    println!("Running single walk...");

    // 1. Script & Synthesize
    let walk = build_walk_params(args)?;
    let truth = synthesize_walk(&walk);

    print_walk_stats(&truth);

    // 2. Generate Sensors
    let stream = generate_sensor_stream(&truth, &build_sensor_config(args));

    // 3. Run the engine
    let run_cfg = build_run_config(args)?;
    let run = run_engine(&stream, &run_cfg);

    let metrics = compute_metrics(&truth, &run);
    println!("\nRun complete:");
    println!("  Endpoint error: {:.2} m", metrics.endpoint_error_m);
    println!("  Mean error:     {:.2} m", metrics.mean_error_m);
    println!(
        "  Steps:          {} est / {} true",
        run.est_steps.last().copied().unwrap_or(0),
        truth.steps.last().copied().unwrap_or(0)
    );
    println!("  Distance:       {:.2} m est", metrics.est_distance_m);
    println!(
        "  Back to start:  {:.2} m at {:.1}°",
        run.back_distance_m.last().copied().unwrap_or(0.0),
        run.back_bearing_deg.last().copied().unwrap_or(0.0)
    );

    if let Some(outcome) = run.calibration {
        match outcome.step_length_m {
            Some(len) => println!(
                "  Calibrated step length: {:.2} m ({} steps / {} s)",
                len, outcome.observed_steps, outcome.elapsed_secs
            ),
            None => println!("  Calibration saw no steps; step length unchanged"),
        }
    }

    // 4. Export
    write_output(args, &truth, &run)?;
    write_session(args, &run)?;
    write_trail(args, &run)?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Sweep Run
// ---------------------------------------------------------------------------
fn run_sweep(args: &Args) -> Result<()> {
    let name = args.sweep_param.as_deref().unwrap_or_default();
    let spec = param_spec(name).with_context(|| {
        let known: Vec<&str> = SWEEPABLE.iter().map(|(n, _)| *n).collect();
        format!("unknown sweep parameter '{}', expected one of {:?}", name, known)
    })?;

    println!("Sweeping {} over [{}, {}]", name, spec.min, spec.max);

    // One script and one sensor stream, shared by every run
    let walk = build_walk_params(args)?;
    let truth = synthesize_walk(&walk);
    let stream = generate_sensor_stream(&truth, &build_sensor_config(args));
    let base_cfg = build_run_config(args)?;

    let values = linspace(spec.min, spec.max, args.sweep_steps);
    let mut summary_rows = Vec::new();

    for (i, &val) in values.iter().enumerate() {
        let mut cfg = base_cfg.clone();
        apply_engine_param(&mut cfg.engine, name, val);

        let run = run_engine(&stream, &cfg);
        let metrics = compute_metrics(&truth, &run);

        println!(
            "Run {}/{} | {} = {:.4} -> endpoint {:.2} m, {} step err",
            i + 1,
            values.len(),
            name,
            val,
            metrics.endpoint_error_m,
            metrics.step_count_error
        );

        summary_rows.push((val, metrics));
    }

    // Write summary
    let path = args.output_dir.join("sweep_summary.csv");
    std::fs::create_dir_all(&args.output_dir)?;
    let mut wtr = csv::Writer::from_path(&path)?;
    wtr.write_record([
        "param",
        "value",
        "endpoint_error_m",
        "mean_error_m",
        "step_count_error",
        "est_distance_m",
    ])?;
    for (val, m) in summary_rows {
        wtr.write_record(&[
            name.to_string(),
            format!("{:.4}", val),
            format!("{:.4}", m.endpoint_error_m),
            format!("{:.4}", m.mean_error_m),
            format!("{}", m.step_count_error),
            format!("{:.4}", m.est_distance_m),
        ])?;
    }
    wtr.flush()?;

    println!("\nSweep complete. Summary at {:?}", path);
    Ok(())
}

// ---------------------------------------------------------------------------
// Tune Run
// ---------------------------------------------------------------------------
fn run_tune(args: &Args) -> Result<()> {
    println!("Tuning {:?} by greedy descent...", args.tune_params);

    let walk = build_walk_params(args)?;
    let truth = synthesize_walk(&walk);
    let stream = generate_sensor_stream(&truth, &build_sensor_config(args));
    let mut cfg = build_run_config(args)?;

    let objective = |run: &RunResult| compute_metrics(&truth, run).mean_error_m;

    let baseline = objective(&run_engine(&stream, &cfg));
    println!("Baseline mean error = {:.4} m", baseline);
    let mut best = baseline;

    for round in 0..args.tune_rounds {
        println!("Tune round {}", round + 1);
        let mut improved = false;

        for name in &args.tune_params {
            let spec = param_spec(name)
                .with_context(|| format!("unknown tune parameter '{}'", name))?;

            let mut best_val = None;
            for &val in &linspace(spec.min, spec.max, args.sweep_steps) {
                let mut candidate = cfg.clone();
                apply_engine_param(&mut candidate.engine, name, val);

                let err = objective(&run_engine(&stream, &candidate));
                if err + 1e-6 < best {
                    best = err;
                    best_val = Some(val);
                }
            }

            if let Some(val) = best_val {
                apply_engine_param(&mut cfg.engine, name, val);
                improved = true;
                println!("Improved {} to {:.4}, mean error {:.4} m", name, val, best);
            }
        }

        if !improved {
            println!("No improvement in round {}, stopping", round + 1);
            break;
        }
    }

    // Output optimised engine config
    let optimised = serde_json::json!({
        "baseline_mean_error_m": baseline,
        "optimised_mean_error_m": best,
        "engine": engine_config_json(&cfg.engine),
    });

    let path = args.output_dir.join("optimised_tuning.json");
    std::fs::create_dir_all(&args.output_dir)?;
    std::fs::write(&path, serde_json::to_string_pretty(&optimised)?)?;
    println!("Optimised tuning written to {:?}", path);

    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn build_walk_params(args: &Args) -> Result<WalkParams> {
    let mut legs = Vec::with_capacity(args.legs.len());
    for spec in &args.legs {
        legs.push(parse_leg(spec)?);
    }
    Ok(WalkParams {
        legs,
        speed_mps: args.speed,
        step_length_m: args.true_step_length,
        accel_amp: args.accel_amp,
        idle_secs: args.idle_secs,
    })
}

fn build_sensor_config(args: &Args) -> SensorConfig {
    SensorConfig {
        noise_scale: args.noise_scale,
        heading_dropout: args.heading_dropout,
        seed: args.seed,
        ..SensorConfig::default()
    }
}

fn build_run_config(args: &Args) -> Result<RunConfig> {
    let mut cfg = RunConfig::default();
    cfg.engine.step_length_m = args.step_length;
    cfg.engine.heading_alpha = args.heading_alpha;
    cfg.engine.pitch_alpha = args.pitch_alpha;
    cfg.calibrate_secs = args.calibrate_secs;

    if let Some(path) = &args.resume_from {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading session record {:?}", path))?;
        let record: SessionRecord = serde_json::from_str(&text)
            .with_context(|| format!("parsing session record {:?}", path))?;
        tracing::info!(
            steps = record.step_count,
            distance_m = record.total_distance_m,
            "resuming previous session"
        );
        cfg.resume = Some(record);
    }
    Ok(cfg)
}

/// Parse one leg spec, "HEADING:METERS" with an optional ":PITCH".
fn parse_leg(spec: &str) -> Result<WalkLeg> {
    let parts: Vec<&str> = spec.split(':').collect();
    if parts.len() != 2 && parts.len() != 3 {
        bail!("leg '{}' is not HEADING:METERS[:PITCH]", spec);
    }

    let heading_deg: f32 = parts[0]
        .parse()
        .with_context(|| format!("bad heading in leg '{}'", spec))?;
    let distance_m: f32 = parts[1]
        .parse()
        .with_context(|| format!("bad distance in leg '{}'", spec))?;
    if distance_m < 0.0 {
        bail!("leg '{}' has a negative distance", spec);
    }
    let pitch_deg: f32 = match parts.get(2) {
        Some(p) => p
            .parse()
            .with_context(|| format!("bad pitch in leg '{}'", spec))?,
        None => 0.0,
    };

    Ok(WalkLeg {
        heading_deg,
        distance_m,
        pitch_deg,
    })
}

fn linspace(min: f32, max: f32, n: usize) -> Vec<f32> {
    let n = n.max(2);
    (0..n)
        .map(|i| min + (max - min) * (i as f32 / (n - 1) as f32))
        .collect()
}

fn print_walk_stats(truth: &WalkTruth) {
    let duration_s = truth.time_ms.last().copied().unwrap_or(0) as f32 / 1000.0;

    println!("\nWalk Stats:");
    println!("  Ticks:      {}", truth.time_ms.len());
    println!("  Duration:   {:.2} s", duration_s);
    println!(
        "  True steps: {}",
        truth.steps.last().copied().unwrap_or(0)
    );
    println!("-----------------------------");
}

fn write_output(args: &Args, truth: &WalkTruth, run: &RunResult) -> Result<()> {
    std::fs::create_dir_all(&args.output_dir)?;
    match args.format {
        OutputFormat::Csv => write_csv(args, truth, run),
        OutputFormat::Json => write_json(args, truth, run),
    }
}

fn write_csv(args: &Args, truth: &WalkTruth, run: &RunResult) -> Result<()> {
    let path = args.output_dir.join("walk.csv");
    let mut wtr = csv::Writer::from_path(&path)?;

    wtr.write_record([
        "time_ms",
        // Walk Truth
        "true_x",
        "true_y",
        "true_heading",
        "true_pitch",
        "true_steps",
        // Engine Estimates
        "est_x",
        "est_y",
        "est_heading",
        "est_altitude",
        "est_steps",
        "back_distance",
        "back_bearing",
    ])?;

    let n = truth.time_ms.len().min(run.time_ms.len());
    for i in 0..n {
        let tp = truth.position[i];
        let ep = run.est_position[i];

        wtr.write_record(&[
            format!("{}", truth.time_ms[i]),
            // Truth
            format!("{:.4}", tp.x),
            format!("{:.4}", tp.y),
            format!("{:.4}", truth.heading_deg[i]),
            format!("{:.4}", truth.pitch_deg[i]),
            format!("{}", truth.steps[i]),
            // Est
            format!("{:.4}", ep.x),
            format!("{:.4}", ep.y),
            format!("{:.4}", run.est_heading_deg[i]),
            format!("{:.4}", run.est_altitude_m[i]),
            format!("{}", run.est_steps[i]),
            format!("{:.4}", run.back_distance_m[i]),
            format!("{:.4}", run.back_bearing_deg[i]),
        ])?;
    }

    wtr.flush()?;
    println!("Data written to {:?}", path);
    Ok(())
}

fn write_json(args: &Args, truth: &WalkTruth, run: &RunResult) -> Result<()> {
    let path = args.output_dir.join("walk.json");
    let n = truth.time_ms.len().min(run.time_ms.len());

    let doc = serde_json::json!({
        "time_ms": &run.time_ms[..n],
        "true_x": truth.position[..n].iter().map(|p| p.x).collect::<Vec<f32>>(),
        "true_y": truth.position[..n].iter().map(|p| p.y).collect::<Vec<f32>>(),
        "true_steps": &truth.steps[..n],
        "est_x": run.est_position[..n].iter().map(|p| p.x).collect::<Vec<f32>>(),
        "est_y": run.est_position[..n].iter().map(|p| p.y).collect::<Vec<f32>>(),
        "est_steps": &run.est_steps[..n],
        "back_distance_m": &run.back_distance_m[..n],
        "back_bearing_deg": &run.back_bearing_deg[..n],
    });

    std::fs::write(&path, serde_json::to_string_pretty(&doc)?)?;
    println!("Data written to {:?}", path);
    Ok(())
}

fn write_session(args: &Args, run: &RunResult) -> Result<()> {
    let path = args.output_dir.join("session.json");
    let text = serde_json::to_string_pretty(&run.record).context("serializing session record")?;
    std::fs::write(&path, text)?;
    println!("Session written to {:?}", path);
    Ok(())
}

fn write_trail(args: &Args, run: &RunResult) -> Result<()> {
    let path = args.output_dir.join("trail.bin");

    let mut packer = TrailPacker::new();
    let mut kept = 0usize;
    for point in &run.record.path {
        if packer.push(*point) {
            kept += 1;
        }
    }
    let frame = packer.finalize();
    std::fs::write(&path, frame)?;

    println!(
        "Trail frame: {} bytes, {} of {} points -> {:?}",
        frame.len(),
        kept,
        run.record.path.len(),
        path
    );
    Ok(())
}

fn engine_config_json(cfg: &homeward_core::EngineConfig) -> serde_json::Value {
    serde_json::json!({
        "step_length_m": cfg.step_length_m,
        "heading_alpha": cfg.heading_alpha,
        "pitch_alpha": cfg.pitch_alpha,
        "detector": {
            "window_len": cfg.detector.window_len,
            "warmup_len": cfg.detector.warmup_len,
            "stationary_std": cfg.detector.stationary_std,
            "threshold_margin": cfg.detector.threshold_margin,
            "min_jump": cfg.detector.min_jump,
            "refractory_ms": cfg.detector.refractory_ms,
        },
        "calibration": {
            "assumed_speed_mps": cfg.calibration.assumed_speed_mps,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_two_part_leg() {
        let leg = parse_leg("90:25").unwrap();
        assert_eq!(leg.heading_deg, 90.0);
        assert_eq!(leg.distance_m, 25.0);
        assert_eq!(leg.pitch_deg, 0.0);
    }

    #[test]
    fn parses_three_part_leg() {
        let leg = parse_leg("180:12.5:-15").unwrap();
        assert_eq!(leg.heading_deg, 180.0);
        assert_eq!(leg.distance_m, 12.5);
        assert_eq!(leg.pitch_deg, -15.0);
    }

    #[test]
    fn rejects_malformed_legs() {
        assert!(parse_leg("90").is_err());
        assert!(parse_leg("n:10").is_err());
        assert!(parse_leg("90:-5").is_err());
        assert!(parse_leg("0:1:2:3").is_err());
    }

    #[test]
    fn linspace_covers_the_range() {
        let vals = linspace(0.0, 1.0, 5);
        assert_eq!(vals.len(), 5);
        assert_eq!(vals[0], 0.0);
        assert_eq!(vals[4], 1.0);

        // Degenerate step counts still produce both endpoints.
        assert_eq!(linspace(2.0, 4.0, 1), vec![2.0, 4.0]);
    }
}
