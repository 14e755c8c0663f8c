use crate::adapters::text_surface::TextSurface;
use crate::core::session::{present, CascadeView, Session};
use crate::domain::model::Stage;
use crate::domain::ports::ImageResolver;
use crate::utils::error::Result;
use std::io::{BufRead, Write};

const HELP: &str = "commands: l <language> | b <brand> | g <group> | r (reset) | q (quit)\n\
                    a value may also be given as its [number]";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Select(Stage, String),
    Reset,
    Quit,
    Help,
}

fn parse_command(line: &str) -> Command {
    let line = line.trim_end_matches(['\r', '\n']);
    let (head, rest) = match line.split_once(' ') {
        Some((head, rest)) => (head, rest),
        None => (line, ""),
    };
    match (head, rest) {
        ("q", _) | ("quit", _) => Command::Quit,
        ("r", _) | ("reset", _) => Command::Reset,
        // 選項值保留原樣（含空白），不做大小寫轉換
        ("l", value) if !value.is_empty() => Command::Select(Stage::Language, value.to_string()),
        ("b", value) if !value.is_empty() => Command::Select(Stage::Brand, value.to_string()),
        ("g", value) if !value.is_empty() => {
            Command::Select(Stage::ProductGroup, value.to_string())
        }
        _ => Command::Help,
    }
}

/// `[n]` picks the n-th listed option; anything else is taken literally.
fn resolve_value(view: Option<&CascadeView<'_>>, stage: Stage, value: &str) -> String {
    let index = value
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'))
        .and_then(|v| v.parse::<usize>().ok());
    let options = view.and_then(|view| match stage {
        Stage::Language => view.languages.as_ref(),
        Stage::Brand => Some(&view.brands),
        Stage::ProductGroup => Some(&view.product_groups),
    });
    match (index, options) {
        (Some(n), Some(options)) if n >= 1 && n <= options.len() => options[n - 1].clone(),
        _ => value.to_string(),
    }
}

/// Line-driven browse loop: renders the cascade, reads one command, repeats until `q` or EOF.
pub fn browse<R: BufRead, W: Write>(
    session: &mut Session,
    resolver: &ImageResolver,
    surface: &mut TextSurface<W>,
    mut input: R,
) -> Result<()> {
    loop {
        let view = present(session, surface, resolver)?;
        let Some(view) = view else {
            // 目錄沒有任何可選資料，無從互動
            return Ok(());
        };
        for stage in &view.resets {
            writeln!(
                surface.writer_mut(),
                "note: previous {} is not available here, showing the first option",
                stage.label()
            )?;
        }
        let selection = view.selection();

        write!(surface.writer_mut(), "> ")?;
        surface.writer_mut().flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(());
        }

        let command = match parse_command(&line) {
            Command::Select(stage, value) => {
                Command::Select(stage, resolve_value(Some(&view), stage, &value))
            }
            other => other,
        };

        // 先固定目前畫面上的選擇，再套用新的上游變更
        *session = Session::with_selection(session.catalog().clone(), selection);
        match command {
            Command::Select(Stage::Language, value) => session.select_language(value),
            Command::Select(Stage::Brand, value) => session.select_brand(value),
            Command::Select(Stage::ProductGroup, value) => session.select_product_group(value),
            Command::Reset => session.clear(),
            Command::Quit => return Ok(()),
            Command::Help => writeln!(surface.writer_mut(), "{}", HELP)?,
        }
    }
}
