//! 替换模板
//!
//! 语法：`\1`、`\12`、`\g<1>`、`\g<name>` 引用分组；`\\ \n \t \r \a \b \f \v`
//! 为转义字符；非字母的其它转义原样保留；未知的字母转义和末尾孤立的 `\`
//! 视为错误。未参与匹配的分组展开为空串。

use crate::kernel::services::ports::search::{Result, SearchError};
use regex::{Captures, Regex};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Literal(String),
    Group(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacementTemplate {
    pieces: Vec<Piece>,
}

impl ReplacementTemplate {
    /// 解析模板并按 `regex` 的分组校验引用
    pub fn parse(template: &str, regex: &Regex) -> Result<Self> {
        let mut pieces = Vec::new();
        let mut literal = String::new();
        let mut chars = template.char_indices().peekable();

        while let Some((_, ch)) = chars.next() {
            if ch != '\\' {
                literal.push(ch);
                continue;
            }

            let Some((at, next)) = chars.next() else {
                return Err(template_error("bad escape (end of template)"));
            };

            match next {
                '\\' => literal.push('\\'),
                'n' => literal.push('\n'),
                't' => literal.push('\t'),
                'r' => literal.push('\r'),
                'a' => literal.push('\x07'),
                'b' => literal.push('\x08'),
                'f' => literal.push('\x0c'),
                'v' => literal.push('\x0b'),
                'g' => {
                    let rest = &template[at + 1..];
                    let Some(body) = rest.strip_prefix('<') else {
                        return Err(template_error("missing < after \\g"));
                    };
                    let Some(close) = body.find('>') else {
                        return Err(template_error("missing >, unterminated name"));
                    };
                    let name = &body[..close];
                    let index = resolve_group(name, regex)?;
                    flush(&mut literal, &mut pieces);
                    pieces.push(Piece::Group(index));

                    // 跳过 `<name>`
                    for _ in 0..name.chars().count() + 2 {
                        chars.next();
                    }
                }
                '0'..='9' => {
                    let mut digits = String::from(next);
                    if let Some(&(_, d)) = chars.peek() {
                        if d.is_ascii_digit() {
                            digits.push(d);
                            chars.next();
                        }
                    }
                    let index: usize = digits
                        .parse()
                        .map_err(|_| template_error(format!("invalid group reference {digits}")))?;
                    if index == 0 || index >= regex.captures_len() {
                        return Err(template_error(format!("invalid group reference {index}")));
                    }
                    flush(&mut literal, &mut pieces);
                    pieces.push(Piece::Group(index));
                }
                c if c.is_ascii_alphabetic() => {
                    return Err(template_error(format!("bad escape \\{c}")));
                }
                c => {
                    literal.push('\\');
                    literal.push(c);
                }
            }
        }

        flush(&mut literal, &mut pieces);
        Ok(Self { pieces })
    }

    pub fn expand(&self, caps: &Captures<'_>) -> String {
        let mut out = String::new();
        for piece in &self.pieces {
            match piece {
                Piece::Literal(s) => out.push_str(s),
                Piece::Group(index) => {
                    if let Some(m) = caps.get(*index) {
                        out.push_str(m.as_str());
                    }
                }
            }
        }
        out
    }

    pub fn is_literal(&self) -> bool {
        self.pieces.iter().all(|p| matches!(p, Piece::Literal(_)))
    }
}

fn flush(literal: &mut String, pieces: &mut Vec<Piece>) {
    if !literal.is_empty() {
        pieces.push(Piece::Literal(std::mem::take(literal)));
    }
}

fn resolve_group(name: &str, regex: &Regex) -> Result<usize> {
    if name.is_empty() {
        return Err(template_error("missing group name"));
    }
    if name.bytes().all(|b| b.is_ascii_digit()) {
        let index: usize = name
            .parse()
            .map_err(|_| template_error(format!("invalid group reference {name}")))?;
        if index >= regex.captures_len() {
            return Err(template_error(format!("invalid group reference {index}")));
        }
        return Ok(index);
    }
    regex
        .capture_names()
        .position(|n| n == Some(name))
        .ok_or_else(|| template_error(format!("unknown group name '{name}'")))
}

fn template_error(message: impl Into<String>) -> SearchError {
    SearchError::InvalidReplacementTemplate(format!(
        "Failed to replace: {}. Use \\\\ for a literal backslash and \\g<index> to reference a group",
        message.into()
    ))
}

#[cfg(test)]
#[path = "../../../../../tests/unit/kernel/services/adapters/search/template.rs"]
mod tests;
