//! Clause-level query parser.
//!
//! Splits raw query text into the clause structure
//! `IMPORT / SELECT / FROM / WHERE / GROUP BY / ORDER BY / LIMIT / OFFSET /
//! TO` and compiles the embedded expression fragments through the supplied
//! evaluator. Keyword recognition is case-insensitive and happens only at
//! the top nesting level: keywords inside single-quoted strings or
//! parentheses never terminate a clause. Clause-order violations, duplicate
//! clauses, and malformed bodies are parse errors raised at construction,
//! before any row is read.

use crate::rowql::sql::ast::{
    FromKind, FromSpec, ImportSpec, NullOrdering, OrderByTerm, OrderDirection, OrderKey,
    OutputKind, ParsedQuery, SelectItem, SelectMode, SelectTerm, ToSpec,
};
use crate::rowql::sql::error::{SqlError, SqlResult};
use crate::rowql::sql::expr::Evaluator;

/// The clause keywords in canonical order. Multi-word keywords are matched
/// as word sequences.
const CLAUSES: &[&str] = &[
    "import", "select", "from", "where", "group by", "order by", "limit", "offset", "to",
];

/// Parses query text into the immutable query model, compiling every
/// expression fragment through `evaluator`.
pub fn parse(query: &str, evaluator: &dyn Evaluator) -> SqlResult<ParsedQuery> {
    let words = scan_top_level_words(query)?;
    let markers = find_clause_markers(&words)?;

    let select_idx = markers
        .iter()
        .position(|m| m.clause == "select")
        .ok_or_else(|| SqlError::parse_error("query must have a SELECT clause", None))?;
    if markers
        .iter()
        .take(select_idx)
        .any(|m| m.clause != "import")
    {
        return Err(SqlError::parse_error(
            "only IMPORT may precede SELECT",
            Some(markers[0].start),
        ));
    }

    let mut imports = Vec::new();
    let mut mode = SelectMode::All;
    let mut select = Vec::new();
    let mut from = None;
    let mut where_clause = None;
    let mut group_by_texts: Vec<String> = Vec::new();
    let mut order_by = Vec::new();
    let mut limit = None;
    let mut offset = 0usize;
    let mut to = None;

    for (i, marker) in markers.iter().enumerate() {
        let body_start = marker.body_start;
        let body_end = markers
            .get(i + 1)
            .map(|next| next.start)
            .unwrap_or(query.len());
        let body = query[body_start..body_end].trim();
        if body.is_empty() {
            return Err(SqlError::parse_error(
                format!("empty {} clause", marker.clause.to_uppercase()),
                Some(marker.start),
            ));
        }
        match marker.clause {
            "import" => imports = parse_imports(body, marker.start)?,
            "select" => {
                let (parsed_mode, items) = parse_select(body, marker.start, evaluator)?;
                mode = parsed_mode;
                select = items;
            }
            "from" => from = Some(parse_from(body, marker.start)?),
            "where" => where_clause = Some(evaluator.compile(body)?),
            "group by" => {
                group_by_texts = split_top_level(body, ',')
                    .into_iter()
                    .map(|s| s.trim().to_string())
                    .collect()
            }
            "order by" => order_by = parse_order_by(body, evaluator)?,
            "limit" => limit = Some(parse_count(body, "LIMIT", marker.start)?),
            "offset" => offset = parse_count(body, "OFFSET", marker.start)?,
            "to" => to = Some(parse_to(body)),
            _ => unreachable!(),
        }
    }

    // GROUP BY column numbers resolve to select-term expressions up front,
    // so the engine only ever sees expression handles as keys.
    let mut group_by = Vec::new();
    for text in &group_by_texts {
        let handle = evaluator.compile(text)?;
        match handle.as_column_number() {
            Some(n) => {
                let term = select
                    .iter()
                    .filter_map(|item| match item {
                        SelectItem::Term(t) => Some(t),
                        SelectItem::Star => None,
                    })
                    .nth(n - 1);
                match (term, select.iter().any(|i| matches!(i, SelectItem::Star))) {
                    (_, true) => {
                        return Err(SqlError::parse_error(
                            "GROUP BY column number cannot be combined with '*'",
                            None,
                        ))
                    }
                    (Some(term), false) => group_by.push(term.expr.clone()),
                    (None, false) => {
                        return Err(SqlError::parse_error(
                            format!("GROUP BY column {} is out of range", n),
                            None,
                        ))
                    }
                }
            }
            None => group_by.push(handle),
        }
    }

    Ok(ParsedQuery {
        query_text: query.trim().to_string(),
        imports,
        mode,
        select,
        from,
        where_clause,
        group_by,
        order_by,
        limit,
        offset,
        to,
    })
}

struct ClauseMarker {
    clause: &'static str,
    /// byte offset of the keyword
    start: usize,
    /// byte offset just past the keyword, where the body begins
    body_start: usize,
}

/// A word found at the top nesting level: outside string literals and
/// outside parentheses.
struct TopWord {
    start: usize,
    end: usize,
    lower: String,
}

fn scan_top_level_words(text: &str) -> SqlResult<Vec<TopWord>> {
    let mut words = Vec::new();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut current: Option<usize> = None;
    let bytes = text.char_indices().collect::<Vec<_>>();

    let mut i = 0;
    while i < bytes.len() {
        let (pos, ch) = bytes[i];
        if in_string {
            if ch == '\'' {
                // '' stays inside the literal
                if matches!(bytes.get(i + 1), Some(&(_, '\''))) {
                    i += 2;
                    continue;
                }
                in_string = false;
            }
            i += 1;
            continue;
        }
        match ch {
            c if (c.is_alphanumeric() || c == '_') && depth == 0 => {
                if current.is_none() && (c.is_alphabetic() || c == '_') {
                    current = Some(pos);
                }
            }
            _ => {
                // a non-word char closes the pending word before taking
                // effect, so a keyword directly followed by '(' or a quote
                // still registers
                if let Some(start) = current.take() {
                    words.push(TopWord {
                        start,
                        end: pos,
                        lower: text[start..pos].to_ascii_lowercase(),
                    });
                }
                match ch {
                    '\'' => in_string = true,
                    '(' => depth += 1,
                    ')' => {
                        depth = depth.checked_sub(1).ok_or_else(|| {
                            SqlError::parse_error("unbalanced ')'", Some(pos))
                        })?;
                    }
                    _ => {}
                }
            }
        }
        i += 1;
    }
    if in_string {
        return Err(SqlError::parse_error("unterminated string literal", None));
    }
    if let Some(start) = current {
        words.push(TopWord {
            start,
            end: text.len(),
            lower: text[start..].to_ascii_lowercase(),
        });
    }
    Ok(words)
}

fn find_clause_markers(words: &[TopWord]) -> SqlResult<Vec<ClauseMarker>> {
    let mut markers: Vec<ClauseMarker> = Vec::new();
    let mut i = 0;
    while i < words.len() {
        let word = &words[i];
        let (clause, consumed) = match word.lower.as_str() {
            "import" | "select" | "from" | "where" | "limit" | "offset" | "to" => {
                (Some(word.lower.clone()), 1)
            }
            "group" | "order" => {
                if matches!(words.get(i + 1), Some(next) if next.lower == "by") {
                    (Some(format!("{} by", word.lower)), 2)
                } else {
                    (None, 1)
                }
            }
            _ => (None, 1),
        };
        if let Some(name) = clause {
            // Only treat the word as a clause keyword if no clause has been
            // seen yet, or it continues the canonical order. A column that
            // happens to be named like a keyword inside an already-open
            // clause still terminates it: keywords are reserved at the top
            // level, as in the clause grammar.
            let canonical = CLAUSES
                .iter()
                .position(|c| *c == name.as_str())
                .expect("clause names come from CLAUSES");
            if let Some(last) = markers.last() {
                let last_idx = CLAUSES
                    .iter()
                    .position(|c| *c == last.clause)
                    .expect("markers hold canonical names");
                if canonical <= last_idx {
                    return Err(SqlError::parse_error(
                        format!(
                            "clause {} out of order (after {})",
                            name.to_uppercase(),
                            last.clause.to_uppercase()
                        ),
                        Some(word.start),
                    ));
                }
            }
            let end = words[i + consumed - 1].end;
            markers.push(ClauseMarker {
                clause: CLAUSES[canonical],
                start: word.start,
                body_start: end,
            });
            i += consumed;
        } else {
            i += 1;
        }
    }
    if markers.is_empty() {
        return Err(SqlError::parse_error("query must have a SELECT clause", None));
    }
    Ok(markers)
}

/// Splits text on a separator at the top nesting level, honoring string
/// literals and parentheses.
pub(crate) fn split_top_level(text: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut start = 0usize;
    let mut chars = text.char_indices().peekable();
    while let Some((pos, ch)) = chars.next() {
        if in_string {
            if ch == '\'' {
                if matches!(chars.peek(), Some(&(_, '\''))) {
                    chars.next();
                } else {
                    in_string = false;
                }
            }
            continue;
        }
        match ch {
            '\'' => in_string = true,
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            c if c == separator && depth == 0 => {
                parts.push(&text[start..pos]);
                start = pos + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

fn parse_imports(body: &str, clause_start: usize) -> SqlResult<Vec<ImportSpec>> {
    let mut imports = Vec::new();
    for part in split_top_level(body, ',') {
        let words: Vec<&str> = part.split_whitespace().collect();
        match words.as_slice() {
            [module] => imports.push(ImportSpec {
                module: module.to_string(),
                alias: None,
            }),
            [module, as_kw, alias] if as_kw.eq_ignore_ascii_case("as") => {
                imports.push(ImportSpec {
                    module: module.to_string(),
                    alias: Some(alias.to_string()),
                })
            }
            _ => {
                return Err(SqlError::parse_error(
                    format!("invalid IMPORT entry '{}'", part.trim()),
                    Some(clause_start),
                ))
            }
        }
    }
    Ok(imports)
}

fn parse_select(
    body: &str,
    clause_start: usize,
    evaluator: &dyn Evaluator,
) -> SqlResult<(SelectMode, Vec<SelectItem>)> {
    let mut rest = body;
    let mut mode = SelectMode::All;
    let first_word = rest.split_whitespace().next().unwrap_or("");
    if first_word.eq_ignore_ascii_case("distinct") {
        mode = SelectMode::Distinct;
        rest = rest[first_word.len()..].trim_start();
    } else if first_word.eq_ignore_ascii_case("partials") {
        mode = SelectMode::Partials;
        rest = rest[first_word.len()..].trim_start();
    }
    if rest.is_empty() {
        return Err(SqlError::parse_error("empty SELECT list", Some(clause_start)));
    }

    let mut items = Vec::new();
    for part in split_top_level(rest, ',') {
        let part = part.trim();
        if part.is_empty() {
            return Err(SqlError::parse_error(
                "empty SELECT list entry",
                Some(clause_start),
            ));
        }
        if part == "*" {
            items.push(SelectItem::Star);
            continue;
        }
        let (expr_text, alias) = split_alias(part);
        let expr = evaluator.compile(expr_text)?;
        items.push(SelectItem::Term(SelectTerm { expr, alias }));
    }
    Ok((mode, items))
}

/// Splits a trailing top-level `AS alias` off a select or order term.
fn split_alias(part: &str) -> (&str, Option<String>) {
    let words = match scan_top_level_words(part) {
        Ok(words) => words,
        Err(_) => return (part, None),
    };
    if words.len() >= 2 {
        let as_word = &words[words.len() - 2];
        let alias_word = &words[words.len() - 1];
        if as_word.lower == "as" && alias_word.end == part.trim_end().len() {
            let alias = part[alias_word.start..alias_word.end].to_string();
            return (part[..as_word.start].trim_end(), Some(alias));
        }
    }
    (part, None)
}

fn parse_from(body: &str, clause_start: usize) -> SqlResult<FromSpec> {
    // optional EXPLODE suffix
    let lower = body.to_ascii_lowercase();
    let (source_text, explode) = match find_keyword(&lower, "explode") {
        Some(pos) => {
            let path_text = body[pos + "explode".len()..].trim();
            if path_text.is_empty() {
                return Err(SqlError::parse_error(
                    "EXPLODE requires a path",
                    Some(clause_start),
                ));
            }
            let path: Vec<String> = path_text
                .split("->")
                .map(|seg| seg.trim().to_string())
                .collect();
            if path.iter().any(|seg| seg.is_empty()) {
                return Err(SqlError::parse_error(
                    format!("invalid EXPLODE path '{}'", path_text),
                    Some(clause_start),
                ));
            }
            (body[..pos].trim(), Some(path))
        }
        None => (body, None),
    };
    if source_text.is_empty() {
        return Err(SqlError::parse_error("empty FROM clause", Some(clause_start)));
    }
    let kind = match source_text.to_ascii_lowercase().as_str() {
        "csv" => FromKind::Csv,
        "json" => FromKind::Json,
        "text" => FromKind::Text,
        _ => FromKind::Name(source_text.to_string()),
    };
    Ok(FromSpec { kind, explode })
}

/// Finds a whole-word keyword in already-lowercased text, outside quotes.
fn find_keyword(lower: &str, keyword: &str) -> Option<usize> {
    let mut in_string = false;
    let bytes = lower.as_bytes();
    let mut i = 0;
    while i + keyword.len() <= bytes.len() {
        let ch = bytes[i] as char;
        if in_string {
            if ch == '\'' {
                in_string = false;
            }
            i += 1;
            continue;
        }
        if ch == '\'' {
            in_string = true;
            i += 1;
            continue;
        }
        if lower.is_char_boundary(i) && lower[i..].starts_with(keyword) {
            let before_ok = i == 0 || !(bytes[i - 1] as char).is_alphanumeric();
            let after = i + keyword.len();
            let after_ok = after == bytes.len() || !(bytes[after] as char).is_alphanumeric();
            if before_ok && after_ok {
                return Some(i);
            }
        }
        i += 1;
    }
    None
}

fn parse_order_by(body: &str, evaluator: &dyn Evaluator) -> SqlResult<Vec<OrderByTerm>> {
    let mut terms = Vec::new();
    for part in split_top_level(body, ',') {
        let mut words: Vec<String> = part.split_whitespace().map(|w| w.to_string()).collect();
        if words.is_empty() {
            return Err(SqlError::parse_error("empty ORDER BY term", None));
        }

        // suffixes parse from the end: [NULLS FIRST|LAST] then [ASC|DESC]
        let mut nulls: Option<NullOrdering> = None;
        if words.len() >= 2 {
            let last = words[words.len() - 1].to_ascii_lowercase();
            let second_last = words[words.len() - 2].to_ascii_lowercase();
            if second_last == "nulls" {
                nulls = Some(match last.as_str() {
                    "first" => NullOrdering::First,
                    "last" => NullOrdering::Last,
                    other => {
                        return Err(SqlError::parse_error(
                            format!("expected FIRST or LAST after NULLS, got '{}'", other),
                            None,
                        ))
                    }
                });
                words.truncate(words.len() - 2);
            }
        }
        let mut direction = OrderDirection::Asc;
        if let Some(last) = words.last() {
            match last.to_ascii_lowercase().as_str() {
                "asc" => {
                    words.pop();
                }
                "desc" => {
                    direction = OrderDirection::Desc;
                    words.pop();
                }
                _ => {}
            }
        }
        if words.is_empty() {
            return Err(SqlError::parse_error("empty ORDER BY term", None));
        }

        let expr_text = words.join(" ");
        let handle = evaluator.compile(&expr_text)?;
        let key = match handle.as_column_number() {
            Some(n) => OrderKey::Column(n),
            None => OrderKey::Expr(handle),
        };
        // default: NULLs sort as largest (last for ASC, first for DESC)
        let nulls = nulls.unwrap_or(match direction {
            OrderDirection::Asc => NullOrdering::Last,
            OrderDirection::Desc => NullOrdering::First,
        });
        terms.push(OrderByTerm {
            key,
            direction,
            nulls,
        });
    }
    Ok(terms)
}

fn parse_count(body: &str, clause: &str, clause_start: usize) -> SqlResult<usize> {
    body.trim().parse::<usize>().map_err(|_| {
        SqlError::parse_error(
            format!("{} requires a non-negative integer, got '{}'", clause, body.trim()),
            Some(clause_start),
        )
    })
}

fn parse_to(body: &str) -> ToSpec {
    match OutputKind::from_keyword(body) {
        Some(kind) => ToSpec::Kind(kind),
        None => ToSpec::Path(body.to_string()),
    }
}
