//! Command-line front end for the BigQuery grammar.
//!
//! `bqparse parse -i FILE` prints the syntax tree of a SQL file as an
//! S-expression. `bqparse tables` and `bqparse conflicts` dump what the
//! grammar compiler produced, for debugging the grammar itself.

#[cfg(feature = "cli")]
mod real {
    use anyhow::{Context, Result, bail};
    use clap::{Parser as ClapParser, Subcommand};
    use grove::Parser;
    use grove_gen::lr::{first_sets, follow_sets};
    use grove_gen::report::{write_conflicts, write_fstflw, write_prods, write_set, write_table};
    use grove_gen::{CompileOptions, TableKind, compile};
    use std::io::{self, Write};
    use std::path::PathBuf;

    #[derive(ClapParser)]
    #[command(about = "Parse BigQuery SQL and inspect the compiled grammar")]
    struct Args {
        /// Enable debug logging (off by default).
        #[arg(short = 'd', long, global = true)]
        debug: bool,

        #[command(subcommand)]
        command: Command,
    }

    #[derive(Subcommand)]
    enum Command {
        /// Print the syntax tree of a SQL file
        Parse {
            /// Path to the SQL file
            #[arg(short = 'i', long)]
            input: PathBuf,

            /// Also print parser and lexer statistics
            #[arg(short = 's', long)]
            stats: bool,
        },
        /// Dump productions, item sets, FIRST/FOLLOW sets and the parse table
        Tables {
            /// Build SLR(1) instead of LALR(1) tables
            #[arg(long)]
            slr: bool,
        },
        /// List conflicts left after precedence resolution
        Conflicts {
            /// Build SLR(1) instead of LALR(1) tables
            #[arg(long)]
            slr: bool,
        },
    }

    fn options(slr: bool) -> CompileOptions {
        CompileOptions {
            table: if slr { TableKind::Slr } else { TableKind::Lalr },
            strict: false,
        }
    }

    pub fn main() -> Result<()> {
        let args = Args::parse();
        if args.debug {
            env_logger::Builder::from_default_env()
                .filter_level(log::LevelFilter::Trace)
                .init();
        } else {
            env_logger::init();
        }

        let stdout = io::stdout();
        let mut out = stdout.lock();
        match args.command {
            Command::Parse { input, stats } => {
                let text = std::fs::read(&input)
                    .with_context(|| format!("Failed to read {}", input.display()))?;
                let language = grove_bigquery::language()?;
                let mut parser = Parser::new();
                parser.set_language(&language)?;
                let tree = parser.parse(&text, None)?;
                writeln!(out, "{}", tree.to_sexp())?;
                if stats {
                    writeln!(out, "{:?}", parser.stats())?;
                    writeln!(out, "{:?}", parser.lexer_stats())?;
                }
                if tree.root_node().has_error() {
                    bail!("{}: syntax errors found", input.display());
                }
            }
            Command::Tables { slr } => {
                let compiled = compile(&grove_bigquery::grammar(), &options(slr))?;
                let grammar = &compiled.grammar;
                let tokens = grammar.symbol_names();
                let prods = grammar.prods();
                let n_nonterm = grammar.nonterminal_count;
                let n_term = grammar.terminal_count();
                let (first, nullable) = first_sets(&prods, n_nonterm, n_term);
                let follow = follow_sets(&prods, n_nonterm, n_term, 0, &first, &nullable);

                write_prods(&mut out, &prods, &tokens)?;
                writeln!(out)?;
                write_set(&mut out, &compiled.automaton, &prods, &tokens)?;
                write_fstflw(&mut out, &first, Some(&nullable), &tokens)?;
                writeln!(out)?;
                write_fstflw(&mut out, &follow, None, &tokens)?;
                writeln!(out)?;
                write_table(&mut out, &compiled.table, &tokens)?;
                writeln!(out)?;
                write_conflicts(&mut out, grammar, &compiled.conflicts)?;
            }
            Command::Conflicts { slr } => {
                let compiled = compile(&grove_bigquery::grammar(), &options(slr))?;
                write_conflicts(&mut out, &compiled.grammar, &compiled.conflicts)?;
            }
        }
        Ok(())
    }
}

#[cfg(feature = "cli")]
fn main() -> anyhow::Result<()> {
    real::main()
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("bqparse disabled (compiled without `cli` feature)");
}
