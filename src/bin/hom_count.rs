use clap::Parser;
use tracing_subscriber::EnvFilter;
use tree_hom_count::{
    config::DEFAULT_MAX_ROW_LEN,
    count_graph_homomorphisms,
    families::Family,
    mapping::count_homomorphisms_brute_force,
    parser::parse_family,
    CountConfig, HomError, OverflowPolicy,
};

/// Count graph homomorphisms along a nice tree decomposition of the source
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Source graph family, e.g. `cycle:4`, `star:3`, `bipartite:2:3`
    #[arg(short, long, value_parser = parse_family)]
    source: Family,

    /// Target graph family, e.g. `clique:5`, `gnp:10:0.3:7`
    #[arg(short, long, value_parser = parse_family)]
    target: Family,

    /// Add a loop to every target vertex
    #[arg(long)]
    reflexive: bool,

    /// Build rows and independent subtrees in parallel
    #[arg(short, long)]
    parallel: bool,

    /// Count modulo 2^64 instead of failing on overflow
    #[arg(long)]
    wrapping: bool,

    /// Skip validating the decomposition against the source graph
    #[arg(long)]
    no_validate: bool,

    /// Largest table row to allocate
    #[arg(long, default_value_t = DEFAULT_MAX_ROW_LEN)]
    max_row_len: usize,

    /// Cross-check against exhaustive enumeration (small inputs only)
    #[arg(long)]
    verify: bool,
}

fn run(args: &Args) -> Result<(), HomError> {
    let (source, decomposition) = args.source.with_nice_decomposition()?;
    let mut target = args.target.graph()?;
    if args.reflexive {
        target = target.with_loops();
    }

    println!(
        "Graph G (source): {} = {} vertices, {} edges",
        args.source,
        source.num_vertices(),
        source.num_edges()
    );
    println!(
        "Graph H (target): {}{} = {} vertices, {} edges, density {:.3}",
        args.target,
        if args.reflexive { " (reflexive)" } else { "" },
        target.num_vertices(),
        target.num_edges(),
        target.density()
    );
    println!(
        "Nice tree decomposition: {} nodes, treewidth {}",
        decomposition.len(),
        decomposition.treewidth()
    );
    println!();

    let config = CountConfig::default()
        .parallel(args.parallel)
        .validate(!args.no_validate)
        .max_row_len(args.max_row_len)
        .overflow(if args.wrapping {
            OverflowPolicy::Wrapping
        } else {
            OverflowPolicy::Checked
        });

    let start_time = std::time::Instant::now();
    let count = count_graph_homomorphisms(&decomposition, &source, &target, &config)?;
    let elapsed = start_time.elapsed();

    println!("Homomorphisms: {}", count);
    println!("Computation time: {:.3} ms", elapsed.as_secs_f64() * 1000.0);

    if args.verify {
        let search_start = std::time::Instant::now();
        let expected = count_homomorphisms_brute_force(&source, &target);
        println!(
            "Brute force: {} ({:.3} ms)",
            expected,
            search_start.elapsed().as_secs_f64() * 1000.0
        );
        if expected != count {
            println!("MISMATCH between tree decomposition and brute force counts");
            std::process::exit(2);
        }
    }

    Ok(())
}

fn main() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();

    let args = Args::parse();

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
