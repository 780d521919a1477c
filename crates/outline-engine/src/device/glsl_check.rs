//! Structural GLSL checker backing `RecordingDevice` compilation.
//!
//! This is not a GLSL front end. It rejects the malformed sources a driver
//! would reject for structural reasons: missing `#version`, unbalanced
//! delimiters, unterminated statements, stray tokens between declarations,
//! and a missing `main`. Errors are formatted like driver logs
//! (`ERROR: 0:<line>: <message>`).

pub(super) fn check(source: &str) -> Result<(), String> {
    let first = source.lines().enumerate().find(|(_, l)| !l.trim().is_empty());
    match first {
        Some((_, line)) if line.trim_start().starts_with("#version") => {}
        Some((idx, _)) => return Err(error(idx + 1, "missing #version directive")),
        None => return Err(error(0, "empty shader source")),
    }

    let mut depth = 0usize;
    let mut parens = 0usize;
    let mut pending = String::new();
    let mut pending_line = 1;
    let mut has_main = false;
    let mut last_line = 1;

    for (idx, raw) in source.lines().enumerate() {
        let line_no = idx + 1;
        last_line = line_no;

        let line = raw.split("//").next().unwrap_or_default();
        if line.trim_start().starts_with('#') {
            continue;
        }

        for ch in line.chars() {
            match ch {
                '(' => {
                    parens += 1;
                    pending.push(ch);
                }
                ')' => {
                    if parens == 0 {
                        return Err(error(line_no, "syntax error, unexpected ')'"));
                    }
                    parens -= 1;
                    pending.push(ch);
                }
                // `for (;;)` headers keep their separators.
                ';' if parens > 0 => pending.push(ch),
                ';' => pending.clear(),
                '{' => {
                    if parens > 0 {
                        return Err(error(line_no, "syntax error, unexpected '{'"));
                    }
                    if depth == 0 {
                        has_main |= check_definition_header(pending.trim(), line_no)?;
                    }
                    depth += 1;
                    pending.clear();
                }
                '}' => {
                    if depth == 0 {
                        return Err(error(line_no, "syntax error, unexpected '}'"));
                    }
                    if !pending.trim().is_empty() {
                        return Err(error(line_no, "syntax error, expected ';' before '}'"));
                    }
                    depth -= 1;
                    pending.clear();
                }
                c => {
                    if !c.is_whitespace() && pending.trim().is_empty() {
                        pending_line = line_no;
                    }
                    pending.push(c);
                }
            }
        }
        pending.push(' ');
    }

    if depth > 0 || parens > 0 {
        return Err(error(last_line, "syntax error, unexpected end of file"));
    }
    if !pending.trim().is_empty() {
        return Err(error(pending_line, "syntax error, expected ';' at end of declaration"));
    }
    if !has_main {
        return Err(error(0, "no definition of 'main' found"));
    }
    Ok(())
}

/// Validates the text in front of a top-level `{`.
///
/// Function definitions must read `<type> <name>(...)`; anything else with a
/// parameter list means a previous declaration ran into it. Blocks without a
/// parameter list (structs, interface blocks) are accepted as-is.
/// Returns whether the definition is `main`.
fn check_definition_header(header: &str, line_no: usize) -> Result<bool, String> {
    let Some(open) = header.find('(') else {
        return Ok(false);
    };

    let words: Vec<&str> = header[..open].split_whitespace().collect();
    match words.len() {
        0 | 1 => Err(error(line_no, "syntax error, expected function definition")),
        2 => Ok(words[1] == "main"),
        n => Err(error(
            line_no,
            &format!("syntax error, unexpected '{}', expecting ',' or ';'", words[n - 2]),
        )),
    }
}

fn error(line: usize, message: &str) -> String {
    format!("ERROR: 0:{line}: {message}\n")
}
