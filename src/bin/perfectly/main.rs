//! Command-line front-end: build, query, and generate test data.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use perfectly::{BuildConfig, Codec, MinimalPhf, Reader, Writer};

#[derive(Debug, Parser)]
#[command(name = "perfectly")]
#[command(about = "Static minimal perfect hashing toolkit", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build a minimal perfect hash function from keys and values
    Build(BuildArgs),
    /// Query a serialized function
    Query(QueryArgs),
    /// Generate random test keys and values
    Gen(GenArgs),
}

#[derive(Debug, Parser)]
struct BuildArgs {
    /// Key file: u64 count, then count u64 keys (little-endian)
    keys: PathBuf,

    /// Value file: u64 count, then count u16 values
    values: PathBuf,

    /// Output file: serialized function followed by reordered values
    output: PathBuf,

    /// Load factor in (0, 1]
    alpha: f64,

    /// Average bucket size
    lambda: f64,

    /// Fixed seed (random seeds with retry when omitted)
    seed: Option<u64>,
}

#[derive(Debug, Parser)]
struct QueryArgs {
    /// Serialized function produced by `build`
    file: PathBuf,

    /// Keys to look up
    #[arg(required = true)]
    keys: Vec<u64>,
}

#[derive(Debug, Parser)]
struct GenArgs {
    /// Number of key/value pairs
    count: u64,

    /// Output key file
    keys: PathBuf,

    /// Output value file
    values: PathBuf,

    /// RNG seed
    #[arg(short, long, default_value_t = 0)]
    seed: u64,
}

fn main() -> Result<()> {
    match Cli::parse().command {
        Command::Build(args) => build(args),
        Command::Query(args) => query(args),
        Command::Gen(args) => gen(args),
    }
}

fn read_keys(path: &Path) -> Result<Vec<u64>> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let mut r = Reader::new(&bytes);
    let keys = r
        .u64_vec()
        .with_context(|| format!("decoding keys from {}", path.display()))?;
    Ok(keys)
}

fn read_values(path: &Path) -> Result<Vec<u16>> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let mut r = Reader::new(&bytes);
    let values = r
        .u16_vec()
        .with_context(|| format!("decoding values from {}", path.display()))?;
    Ok(values)
}

fn build(args: BuildArgs) -> Result<()> {
    let keys = read_keys(&args.keys)?;
    let values = read_values(&args.values)?;
    if keys.len() != values.len() {
        bail!(
            "key/value count mismatch: {} keys, {} values",
            keys.len(),
            values.len()
        );
    }

    let config = BuildConfig {
        alpha: args.alpha,
        lambda: args.lambda,
        seed: args.seed,
    };
    let phf = MinimalPhf::build(&keys, &config).context("building the hash function")?;
    eprintln!(
        "built: {} keys, table size {}, seed {}",
        phf.num_keys(),
        phf.table_size(),
        phf.seed()
    );

    // Permute the payload so values[phf.lookup(key)] is key's value.
    let mut reordered = vec![0u16; keys.len()];
    for (&key, &value) in keys.iter().zip(&values) {
        reordered[phf.lookup(key) as usize] = value;
    }

    let mut w = Writer::new();
    phf.write(&mut w);
    w.u16_slice(&reordered);
    fs::write(&args.output, w.into_bytes())
        .with_context(|| format!("writing {}", args.output.display()))?;
    eprintln!("wrote {}", args.output.display());
    Ok(())
}

fn query(args: QueryArgs) -> Result<()> {
    let bytes = fs::read(&args.file).with_context(|| format!("reading {}", args.file.display()))?;
    let mut r = Reader::new(&bytes);
    let phf = MinimalPhf::read(&mut r).context("decoding the hash function")?;
    let values = r.u16_vec().context("decoding the value payload")?;
    if values.len() as u64 != phf.num_keys() {
        bail!(
            "payload holds {} values for {} keys",
            values.len(),
            phf.num_keys()
        );
    }

    for key in args.keys {
        let index = phf.lookup(key);
        println!("{key} {index} {}", values[index as usize]);
    }
    Ok(())
}

fn gen(args: GenArgs) -> Result<()> {
    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);

    let mut seen = std::collections::HashSet::with_capacity(args.count as usize);
    let mut keys = Vec::with_capacity(args.count as usize);
    while keys.len() < args.count as usize {
        let key: u64 = rng.gen();
        if seen.insert(key) {
            keys.push(key);
        }
    }
    let values: Vec<u16> = (0..args.count).map(|_| rng.gen()).collect();

    let mut kw = Writer::new();
    kw.u64_slice(&keys);
    fs::write(&args.keys, kw.into_bytes())
        .with_context(|| format!("writing {}", args.keys.display()))?;

    let mut vw = Writer::new();
    vw.u16_slice(&values);
    fs::write(&args.values, vw.into_bytes())
        .with_context(|| format!("writing {}", args.values.display()))?;

    eprintln!("generated {} pairs", args.count);
    Ok(())
}
