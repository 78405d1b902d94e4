use escaper::encode_minimal;
use regex::{Regex, RegexBuilder};

use crate::domain::{ingredient::entities::IngredientList, recipe::entities::RecipeResult};

const SHOPPING_LIST_MARKERS: &[&str] = &["LISTA DE COMPRAS", "LISTA DE LA COMPRA", "SHOPPING LIST"];
const TITLE_PREFIXES: &[&str] = &["nombre de la receta:", "receta:"];
const LIST_MARKERS: &[char] = &['-', '*', '•', '·'];

/// Turns raw recipe answers into HTML cards, highlighting the ingredients the
/// user already has.
#[derive(Debug, Clone)]
pub struct RecipeFormatter {
    highlight: Option<Regex>,
}

impl RecipeFormatter {
    pub fn new(available: &IngredientList) -> Self {
        Self {
            highlight: build_highlight_regex(available),
        }
    }

    pub fn format(&self, text: &str) -> RecipeResult {
        let sections = split_sections(text);
        let title = if sections.title.is_empty() {
            "Receta".to_string()
        } else {
            sections.title
        };

        let content = sections
            .body
            .iter()
            .map(|line| self.highlight_line(&bulletize(line)))
            .collect::<Vec<_>>()
            .join("<br>");

        let html = render_card(&title, &content, &sections.shopping_list);

        RecipeResult {
            title,
            html,
            shopping_list: sections.shopping_list,
        }
    }

    /// Matches on the raw line and escapes the text around each match, so
    /// a highlight never lands inside an HTML entity.
    fn highlight_line(&self, line: &str) -> String {
        let Some(regex) = &self.highlight else {
            return encode_minimal(line);
        };

        let mut html = String::with_capacity(line.len());
        let mut copied = 0;
        let mut search = 0;
        while search <= line.len() {
            let Some(found) = regex.find_at(line, search) else {
                break;
            };
            if is_word_bounded(line, found.start(), found.end()) {
                html.push_str(&encode_minimal(&line[copied..found.start()]));
                html.push_str(r#"<span class="available-ingredient">"#);
                html.push_str(&encode_minimal(found.as_str()));
                html.push_str("</span>");
                copied = found.end();
                search = found.end();
            } else {
                // Retry one character later so a shorter name can still match.
                search = found.start()
                    + line[found.start()..]
                        .chars()
                        .next()
                        .map_or(1, char::len_utf8);
            }
        }
        html.push_str(&encode_minimal(&line[copied..]));
        html
    }
}

#[derive(Debug, Default)]
struct Sections {
    title: String,
    body: Vec<String>,
    shopping_list: Vec<String>,
}

fn split_sections(text: &str) -> Sections {
    let lines = text.lines().map(str::trim).collect::<Vec<_>>();
    let title_index = find_title(&lines);

    let mut sections = Sections {
        title: title_index
            .map(|i| clean_title(lines[i]))
            .unwrap_or_default(),
        ..Sections::default()
    };

    let mut in_shopping_list = false;
    for (i, raw) in lines.iter().enumerate() {
        if Some(i) == title_index {
            continue;
        }

        let is_heading = raw.starts_with('#');
        let line = strip_markdown(raw);

        if is_shopping_list_heading(&line) {
            in_shopping_list = true;
            continue;
        }
        if in_shopping_list && is_heading {
            in_shopping_list = false;
        }

        if in_shopping_list {
            if let Some(item) = shopping_item(&line) {
                sections.shopping_list.push(item);
            }
        } else if !is_template_note(&line) {
            sections.body.push(line);
        }
    }

    trim_blank_edges(&mut sections.body);
    sections
}

/// Index of the line holding the recipe name: the first level-one heading,
/// else a line announcing the name, else the first non-empty line.
fn find_title(lines: &[&str]) -> Option<usize> {
    let candidates = || {
        lines
            .iter()
            .enumerate()
            .filter(|(_, line)| {
                let cleaned = strip_markdown(line);
                !cleaned.is_empty() && !is_template_note(&cleaned)
            })
    };

    candidates()
        .find(|(_, line)| line.starts_with("# "))
        .or_else(|| {
            candidates().find(|(_, line)| line.to_lowercase().contains("nombre de la receta"))
        })
        .or_else(|| candidates().next())
        .map(|(i, _)| i)
}

fn clean_title(raw: &str) -> String {
    let mut title = strip_markdown(raw);
    let lower = title.to_lowercase();
    if let Some(rest) = TITLE_PREFIXES
        .iter()
        .find(|prefix| lower.starts_with(*prefix))
        .and_then(|prefix| title.get(prefix.len()..))
    {
        title = rest.to_string();
    }
    title
        .trim()
        .trim_matches(|c| c == '"' || c == '“' || c == '”')
        .trim()
        .to_string()
}

/// Drops emphasis markers and leading heading hashes.
fn strip_markdown(line: &str) -> String {
    line.trim_start_matches('#')
        .replace("**", "")
        .replace("__", "")
        .trim()
        .to_string()
}

fn is_shopping_list_heading(line: &str) -> bool {
    let upper = line.to_uppercase();
    SHOPPING_LIST_MARKERS
        .iter()
        .any(|marker| upper.contains(marker))
}

/// Template scaffolding the model sometimes echoes back.
fn is_template_note(line: &str) -> bool {
    let line = line.trim_matches('*').trim();
    line.eq_ignore_ascii_case("[receta]")
        || (line.starts_with("[Nota") && line.ends_with(']'))
        || (line.starts_with("(Solo incluir") && line.ends_with(')'))
        || (line.starts_with("(Un nombre creativo") && line.ends_with(')'))
}

fn shopping_item(line: &str) -> Option<String> {
    let item = line
        .trim()
        .trim_start_matches(LIST_MARKERS)
        .trim()
        .trim_start_matches("[ ]")
        .trim_start_matches("[x]")
        .trim_start_matches("[X]")
        .trim()
        .trim_matches('*')
        .trim();

    if item.is_empty() || item.ends_with(':') || is_template_note(item) {
        return None;
    }
    Some(item.to_string())
}

/// Replaces `-`/`*` list markers with a bullet; numbered steps keep their
/// numbers.
fn bulletize(line: &str) -> String {
    let leading = line.len() - line.trim_start().len();
    let rest = &line[leading..];
    match rest.chars().next() {
        Some(marker)
            if LIST_MARKERS.contains(&marker) && rest[marker.len_utf8()..].starts_with(' ') =>
        {
            format!(
                "{}• {}",
                &line[..leading],
                rest[marker.len_utf8()..].trim_start()
            )
        }
        _ => line.replace('*', ""),
    }
}

fn trim_blank_edges(lines: &mut Vec<String>) {
    while lines.first().is_some_and(|l| l.is_empty()) {
        lines.remove(0);
    }
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
}

fn build_highlight_regex(available: &IngredientList) -> Option<Regex> {
    let mut names = available
        .iter()
        .map(|name| name.trim().trim_end_matches('.').trim())
        .filter(|name| name.chars().count() > 1)
        .map(regex::escape)
        .collect::<Vec<_>>();
    if names.is_empty() {
        return None;
    }
    // Longest first so "pimiento rojo" wins over "pimiento".
    names.sort_by_key(|name| std::cmp::Reverse(name.len()));
    names.dedup();

    RegexBuilder::new(&names.join("|"))
        .case_insensitive(true)
        .build()
        .map_err(|e| {
            tracing::warn!(error = %e, "Could not build ingredient highlight pattern");
        })
        .ok()
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// A match may not run into a neighbouring word. Names that start or end
/// with punctuation, like `huevos (6)`, bound themselves on that side.
fn is_word_bounded(line: &str, start: usize, end: usize) -> bool {
    let matched = &line[start..end];
    let before = match (line[..start].chars().next_back(), matched.chars().next()) {
        (Some(prev), Some(first)) => !(is_word_char(prev) && is_word_char(first)),
        _ => true,
    };
    let after = match (matched.chars().next_back(), line[end..].chars().next()) {
        (Some(last), Some(next)) => !(is_word_char(last) && is_word_char(next)),
        _ => true,
    };
    before && after
}

fn render_card(title: &str, content: &str, shopping_list: &[String]) -> String {
    let shopping_list_html = if shopping_list.is_empty() {
        String::new()
    } else {
        let items = shopping_list
            .iter()
            .map(|item| {
                format!(
                    r#"<li class="shopping-list-item"><i class="fas fa-shopping-basket"></i><span>{}</span></li>"#,
                    encode_minimal(item)
                )
            })
            .collect::<String>();
        format!(
            r#"<div class="shopping-list"><div class="shopping-list-header"><i class="fas fa-shopping-cart"></i><h3>Lista de compra sugerida</h3><button class="btn btn-outline-primary copy-shopping-list" title="Copiar lista de compra"><i class="fas fa-copy"></i></button></div><ul class="shopping-list-items">{}</ul></div>"#,
            items
        )
    };

    format!(
        r#"<div class="recipe-card"><div class="recipe-header"><h2 class="recipe-title">{}</h2><button class="btn btn-outline-primary copy-button" title="Copiar receta"><i class="fas fa-copy"></i></button></div><div class="recipe-content">{}</div>{}</div>"#,
        encode_minimal(title),
        content,
        shopping_list_html
    )
}
