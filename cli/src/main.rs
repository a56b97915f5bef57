mod highlighter;
mod lexer;

use calyx::{AutoVariables, Expression, Parser as ExpressionParser, Settings, SymbolTable, render_error};
use clap::Parser;
use highlighter::Highlighter;
use lexer::BracketValidator;
use miette::{IntoDiagnostic, Result};
use reedline::{
    DefaultCompleter, DefaultPrompt, DefaultPromptSegment, DescriptionMode, EditCommand, Emacs,
    IdeMenu, KeyCode, KeyModifiers, Keybindings, MenuBuilder, Reedline, ReedlineEvent,
    ReedlineMenu, Signal, default_emacs_keybindings,
};
use std::io::BufRead;
use std::io::BufReader;
use std::rc::Rc;

/// Calyx - an embeddable mathematical expression compiler
#[derive(Parser, Debug)]
#[command(name = "calyx")]
#[command(about = "Evaluate Calyx expressions", long_about = None)]
struct Args {
    /// Print the variables, functions and assignment targets each expression uses
    #[arg(long)]
    dump_entities: bool,

    /// Maximum sub-expression nesting accepted by the parser
    #[arg(long)]
    max_stack_depth: Option<usize>,

    /// Treat unknown symbols as errors instead of creating variables
    #[arg(long)]
    strict: bool,

    /// Expression to evaluate (if not provided, reads from stdin)
    expression: Option<String>,
}

/// Parser plus the symbol table shared by every line of a session, so
/// variables created on one line stay visible on the next.
struct Session {
    parser: ExpressionParser,
    table: SymbolTable,
    expression: Expression,
    dump_entities: bool,
}

impl Session {
    fn new(args: &Args) -> Result<Self> {
        let mut settings = Settings::default();
        if let Some(depth) = args.max_stack_depth {
            settings = settings.with_max_stack_depth(depth);
        }
        if args.dump_entities {
            settings = settings.collect_all();
        }

        let mut parser = ExpressionParser::new(settings);
        if !args.strict {
            parser.enable_unknown_symbol_resolver(Rc::new(AutoVariables));
        }

        let table = SymbolTable::new();
        table.add_constants().into_diagnostic()?;
        let mut expression = Expression::new();
        expression.register_symbol_table(table.clone());

        Ok(Self {
            parser,
            table,
            expression,
            dump_entities: args.dump_entities,
        })
    }

    fn interpret(&mut self, input: &str) {
        if input.trim().is_empty() {
            return;
        }

        if let Err(err) = self.parser.compile_checked(input, &mut self.expression) {
            render_error(&err);
            return;
        }

        if self.dump_entities {
            self.dump();
        }

        match self.expression.evaluate() {
            Ok(value) if self.expression.return_invoked() => {
                let results = self.expression.results();
                let rendered: Vec<String> = results.iter().map(ToString::to_string).collect();
                println!("return [{}]", rendered.join(", "));
                tracing::debug!(%value, "Expression returned");
            }
            Ok(value) => println!("{value}"),
            Err(err) => render_error(&err),
        }
    }

    fn dump(&self) {
        let entities = self.parser.dependent_entities();
        println!("=== Dependent Entities ===");
        for (name, kind) in entities.symbols() {
            println!("  symbol     {name} ({kind})");
        }
        for (name, kind) in entities.assignments() {
            println!("  assignment {name} ({kind})");
        }
        for signature in entities.return_signatures() {
            println!("  return     [{signature}]");
        }
        println!();
    }

    fn variable_names(&self) -> Vec<String> {
        self.table.variable_names()
    }
}

fn add_menu_keybindings(keybindings: &mut Keybindings) {
    keybindings.add_binding(
        KeyModifiers::NONE,
        KeyCode::Tab,
        ReedlineEvent::UntilFound(vec![
            ReedlineEvent::Menu("completion_menu".to_string()),
            ReedlineEvent::MenuNext,
        ]),
    );
    keybindings.add_binding(
        KeyModifiers::ALT,
        KeyCode::Enter,
        ReedlineEvent::Edit(vec![EditCommand::InsertNewline]),
    );
}

fn completions(session: &Session) -> Vec<String> {
    let mut words: Vec<String> = calyx_core::symbols::RESERVED_WORDS
        .iter()
        .map(|w| w.to_string())
        .collect();
    words.extend(
        calyx_core::evaluator::BASE_FUNCTION_NAMES
            .iter()
            .map(|(name, _, _)| name.to_string()),
    );
    words.extend(session.variable_names());
    words
}

fn setup_reedline(session: &Session) -> (Reedline, DefaultPrompt) {
    let completer = Box::new({
        let mut completer = DefaultCompleter::with_inclusions(&['_', '$']);
        completer.insert(completions(session));
        completer
    });

    let ide_menu = IdeMenu::default()
        .with_name("completion_menu")
        .with_min_completion_width(0)
        .with_max_completion_width(50)
        .with_max_completion_height(u16::MAX)
        .with_padding(0)
        .with_cursor_offset(0)
        .with_description_mode(DescriptionMode::PreferRight)
        .with_min_description_width(0)
        .with_max_description_width(50)
        .with_description_offset(1)
        .with_correct_cursor_pos(false);

    let mut keybindings = default_emacs_keybindings();
    add_menu_keybindings(&mut keybindings);

    let line_editor = Reedline::create()
        .with_highlighter(Box::new(Highlighter))
        .with_validator(Box::new(BracketValidator))
        .with_completer(completer)
        .with_menu(ReedlineMenu::EngineCompleter(Box::new(ide_menu)))
        .with_edit_mode(Box::new(Emacs::new(keybindings)));

    let prompt = DefaultPrompt::new(DefaultPromptSegment::Empty, DefaultPromptSegment::Empty);

    (line_editor, prompt)
}

fn main() -> Result<()> {
    let args = Args::parse();

    use tracing_subscriber::{EnvFilter, fmt};

    // RUST_LOG controls the level; WARN when unset.
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("warn"))
        .into_diagnostic()?;

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let mut session = Session::new(&args)?;

    if let Some(expr) = &args.expression {
        session.interpret(expr);
        return Ok(());
    }

    if atty::is(atty::Stream::Stdin) {
        let (mut line_editor, prompt) = setup_reedline(&session);

        println!("Calyx REPL - Type expressions to evaluate (Ctrl+D or Ctrl+C to exit)");

        loop {
            let sig = match line_editor.read_line(&prompt) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("Reedline error: {e}");
                    return Ok(());
                }
            };

            match sig {
                Signal::Success(buffer) => session.interpret(&buffer),
                Signal::CtrlD | Signal::CtrlC => {
                    println!("\nGoodbye!");
                    return Ok(());
                }
            }
        }
    } else {
        let stdin = std::io::stdin();
        let reader = BufReader::new(stdin.lock());

        for line in reader.lines() {
            let line = line.into_diagnostic()?;
            session.interpret(&line);
        }
    }

    Ok(())
}
