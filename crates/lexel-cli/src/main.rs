use anyhow::Context as _;
use clap::{Parser, ValueEnum};
use lexel::analysis::StaticAnalyzer;
use lexel::grammar::{examples, Grammar, SymbolId};
use lexel::lexer::{LexerBuilder, Tokenizer};
use std::{fs, path::PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The path of the token rules file, one `NAME = regex` per line.
    rules: Option<PathBuf>,

    /// Input files to tokenize.
    input: Vec<PathBuf>,

    /// The scanner alphabet as a literal string of characters. Defaults to
    /// the operand characters appearing in the rules.
    #[arg(long)]
    alphabet: Option<String>,

    /// Print each rule's minimized automaton before scanning.
    #[arg(long)]
    dump_automaton: bool,

    /// Print the FIRST/FOLLOW tables of a built-in example grammar instead
    /// of tokenizing.
    #[arg(long, value_enum)]
    grammar: Option<ExampleGrammar>,
}

#[derive(Debug, Copy, Clone, PartialEq, ValueEnum)]
enum ExampleGrammar {
    Expression,
    Nullable,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    tracing::debug!("parsed CLI args = {:?}", args);

    if let Some(example) = args.grammar {
        analyze_grammar(example);
        return Ok(());
    }

    let rules_file = args
        .rules
        .context("a rules file is required unless --grammar is given")?;
    let rules_text = fs::read_to_string(&rules_file)
        .with_context(|| format!("failed to read rules file {}", rules_file.display()))?;
    let rules = parse_rules(&rules_text)?;

    let alphabet: Vec<char> = match &args.alphabet {
        Some(chars) => chars.chars().collect(),
        None => rules
            .iter()
            .flat_map(|(_, pattern)| pattern.chars())
            .filter(|c| !matches!(c, '|' | '*' | '?' | '+' | '(' | ')'))
            .collect(),
    };

    let mut builder = LexerBuilder::new(alphabet);
    for (name, pattern) in &rules {
        builder = builder.rule(name.as_str(), pattern.as_str());
    }
    let tokenizer = builder.build().context("failed to build the tokenizer")?;

    if args.dump_automaton {
        dump_automata(&tokenizer);
    }

    for in_file in &args.input {
        tracing::info!("tokenize {}", in_file.display());
        let input = fs::read_to_string(in_file)
            .with_context(|| format!("failed to read input file {}", in_file.display()))?;
        let tokens = tokenizer
            .tokenize(&input)
            .with_context(|| anyhow::anyhow!("errored during tokenizing {}", in_file.display()))?;
        for token in &tokens {
            println!("{}", token);
        }
    }

    Ok(())
}

fn parse_rules(text: &str) -> anyhow::Result<Vec<(String, String)>> {
    let mut rules = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (name, pattern) = line
            .split_once('=')
            .with_context(|| format!("line {}: expected `NAME = regex`", lineno + 1))?;
        rules.push((name.trim().to_owned(), pattern.trim().to_owned()));
    }
    Ok(rules)
}

fn dump_automata(tokenizer: &Tokenizer) {
    for rule in tokenizer.rules() {
        println!("## rule {}", rule.name());
        println!("{}", rule.dfa());
    }
}

fn analyze_grammar(example: ExampleGrammar) {
    let grammar = match example {
        ExampleGrammar::Expression => Grammar::define(examples::expression),
        ExampleGrammar::Nullable => Grammar::define(examples::with_nullable),
    };
    println!("{}", grammar);

    let analyzer = StaticAnalyzer::new(&grammar);
    let first = analyzer.first();
    println!("FIRST:");
    for (id, name) in grammar.nonterminals() {
        let of_nonterminal = &first[&SymbolId::N(id)];
        print!("  {} : {}", name, of_nonterminal.terminals.display(&grammar));
        if of_nonterminal.nullable {
            print!(" (nullable)");
        }
        println!();
    }

    let follow = analyzer.follow();
    println!("FOLLOW:");
    for (id, name) in grammar.nonterminals() {
        println!("  {} : {}", name, follow[&id].display(&grammar));
    }
}
