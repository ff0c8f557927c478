//! Frame-error-rate simulation over a binary symmetric channel.
//!
//! Loads an LDPC code (or builds a seeded random one), optionally applies
//! rate adaption, and measures how often belief propagation recovers the
//! transmitted word. Results are printed as JSON so they can be collected
//! by sweep scripts.

mod channel;

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use ldpc_ra::example_codes::random_regular_code;
use ldpc_ra::{
    llrs_bsc, load_code, Mod2Csc, RateAdaptionSchedule, RateAdaptiveCode,
};

use channel::{h2, noise_bitstring_inplace, random_bitstring};

#[derive(Parser)]
#[clap(version)]
#[clap(about = "Frame error rate simulation for rate-adaptive LDPC reconciliation")]
struct Args {
    /// Channel bit-flip probability
    #[clap(short = 'p', long, default_value_t = 0.02)]
    error_prob: f64,

    /// Number of frames to simulate
    #[clap(short = 'f', long, default_value_t = 100)]
    frames: usize,

    /// Iteration budget per decode call
    #[clap(long, default_value_t = ldpc_ra::DEFAULT_MAX_ITERATIONS)]
    max_iterations: usize,

    /// Message saturation bound
    #[clap(long, default_value_t = ldpc_ra::DEFAULT_VSAT)]
    vsat: f64,

    /// RNG seed for channel noise and key generation
    #[clap(short = 's', long, default_value_t = 0)]
    seed: u64,

    /// Path to a .cscmat file holding the mother matrix; a seeded random
    /// regular code is generated when omitted
    #[clap(long)]
    code_file: Option<PathBuf>,

    /// Path to a rate-adaption CSV (row index pairs)
    #[clap(long)]
    rate_adaption_file: Option<PathBuf>,

    /// Rate-adaption steps to apply before simulating
    #[clap(long, default_value_t = 0)]
    ra_steps: usize,

    /// Rows of the generated code (with no --code-file)
    #[clap(long, default_value_t = 2048)]
    rows: usize,

    /// Columns of the generated code (with no --code-file)
    #[clap(long, default_value_t = 6144)]
    cols: usize,

    /// Column degree of the generated code (with no --code-file)
    #[clap(long, default_value_t = 3)]
    col_degree: usize,
}

#[derive(Serialize)]
struct SimulationSummary {
    error_prob: f64,
    frames: usize,
    converged_frames: usize,
    correct_frames: usize,
    frame_error_rate: f64,
    avg_iterations: f64,
    syndrome_bits: usize,
    key_bits: usize,
    /// Syndrome bits disclosed per key bit, relative to the Slepian-Wolf
    /// bound h2(p); 1.0 would be a perfect code.
    reconciliation_efficiency: f64,
}

fn build_code(args: &Args) -> anyhow::Result<RateAdaptiveCode> {
    let mut code = match &args.code_file {
        Some(path) => load_code(path, args.rate_adaption_file.as_deref())
            .with_context(|| format!("loading code from '{}'", path.display()))?,
        None => {
            if args.rate_adaption_file.is_some() {
                bail!("--rate-adaption-file requires --code-file");
            }
            let (colptr, rowval) =
                random_regular_code(args.rows, args.cols, args.col_degree, args.seed);
            let matrix = Mod2Csc::new(colptr, rowval).context("generated matrix was invalid")?;
            if args.ra_steps > 0 {
                // a generated code gets an interleaved default schedule
                let rows_to_combine: Vec<u32> = (0..2 * args.ra_steps as u32).collect();
                let schedule = RateAdaptionSchedule::new(rows_to_combine)?;
                RateAdaptiveCode::with_rate_adaption(matrix, schedule, 0)?
            } else {
                RateAdaptiveCode::from_csc(matrix)
            }
        }
    };
    code.set_rate(args.ra_steps)
        .context("applying initial rate adaption")?;
    Ok(code)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    if args.error_prob <= 0.0 || args.error_prob >= 0.5 {
        bail!("--error-prob must lie in (0, 0.5)");
    }
    if args.frames == 0 {
        bail!("--frames must be positive");
    }

    let code = build_code(&args)?;
    tracing::info!(
        rows = code.current_rows(),
        mother_rows = code.mother_rows(),
        cols = code.cols(),
        ra_steps = code.current_ra_steps(),
        "code ready"
    );

    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);
    let mut converged_frames = 0usize;
    let mut correct_frames = 0usize;
    let mut total_iterations = 0usize;

    let mut syndrome = Vec::new();
    let mut decoded = Vec::new();
    for frame in 0..args.frames {
        let x = random_bitstring(&mut rng, code.cols());
        code.encode_at_current_rate(&x, &mut syndrome)?;

        let mut noised = x.clone();
        noise_bitstring_inplace(&mut rng, &mut noised, args.error_prob);
        let llrs = llrs_bsc(&noised, args.error_prob);

        let result = code.decode_at_current_rate(
            &llrs,
            &syndrome,
            &mut decoded,
            args.max_iterations,
            args.vsat,
        )?;
        total_iterations += result.iterations;
        if result.converged() {
            converged_frames += 1;
            if decoded == x {
                correct_frames += 1;
            }
        }

        if (frame + 1) % 100 == 0 {
            tracing::info!(
                frame = frame + 1,
                converged = converged_frames,
                correct = correct_frames,
                "progress"
            );
        }
    }

    let summary = SimulationSummary {
        error_prob: args.error_prob,
        frames: args.frames,
        converged_frames,
        correct_frames,
        frame_error_rate: 1.0 - correct_frames as f64 / args.frames as f64,
        avg_iterations: total_iterations as f64 / args.frames as f64,
        syndrome_bits: code.current_rows(),
        key_bits: code.cols(),
        reconciliation_efficiency: code.current_rows() as f64
            / (code.cols() as f64 * h2(args.error_prob)),
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
