//! 文档内匹配引擎
//!
//! 无状态，只借用已编译的 `SearchPattern`；所有偏移为 UTF-8 字节偏移，
//! 不在字符边界上的偏移会向后对齐。

use super::template::ReplacementTemplate;
use crate::kernel::services::ports::search::{Match, Result, SearchPattern};
use memchr::{memchr_iter, memrchr};
use regex::Regex;
use std::collections::HashSet;

pub struct MatchEngine<'p> {
    pattern: &'p SearchPattern,
}

impl<'p> MatchEngine<'p> {
    pub fn new(pattern: &'p SearchPattern) -> Self {
        Self { pattern }
    }

    pub fn pattern(&self) -> &SearchPattern {
        self.pattern
    }

    fn regex(&self) -> &Regex {
        self.pattern.regex()
    }

    /// 从 `from` 向后查找；未找到且 `wrap` 时从头再找一次
    pub fn find_next(&self, text: &str, from: usize, wrap: bool) -> Option<Match> {
        let from = snap_to_char_boundary(text, from);
        if let Some(m) = self.regex().find_at(text, from) {
            return Some(to_match(text, m.start(), m.end()));
        }
        if wrap && from > 0 {
            return self
                .regex()
                .find_at(text, 0)
                .map(|m| to_match(text, m.start(), m.end()));
        }
        None
    }

    /// 最后一个 `start < before` 的匹配；未找到且 `wrap` 时取全文最后一个匹配
    pub fn find_previous(&self, text: &str, before: usize, wrap: bool) -> Option<Match> {
        let mut previous = None;
        let mut last = None;
        for (start, end) in self.spans(text) {
            if start < before {
                previous = Some((start, end));
            }
            last = Some((start, end));
        }

        let (start, end) = match previous {
            Some(span) => span,
            None if wrap => last?,
            None => return None,
        };
        Some(to_match(text, start, end))
    }

    pub fn find_all(&self, text: &str) -> Vec<Match> {
        let mut lines = LineIndex::new(text);
        self.spans(text)
            .map(|(start, end)| lines.locate(start, end))
            .collect()
    }

    /// 找到 `from` 处（或回绕后）的第一个匹配，返回它和展开后的替换文本。
    /// 不修改任何缓冲区。
    pub fn replace_one(
        &self,
        text: &str,
        from: usize,
        template: &str,
    ) -> Result<Option<(Match, String)>> {
        let template = ReplacementTemplate::parse(template, self.regex())?;
        let Some(found) = self.find_next(text, from, true) else {
            return Ok(None);
        };
        let Some(caps) = self.regex().captures_at(text, found.start) else {
            return Ok(None);
        };
        let replacement = template.expand(&caps);
        Ok(Some((found, replacement)))
    }

    /// 全文替换，返回新文本和替换次数
    pub fn replace_all(&self, text: &str, template: &str) -> Result<(String, usize)> {
        let template = ReplacementTemplate::parse(template, self.regex())?;
        Ok(self.replace_where(text, &template, |_, _| true))
    }

    /// 只替换与 `selected` 中某个匹配区间完全相同的匹配
    pub fn replace_selected(
        &self,
        text: &str,
        template: &str,
        selected: &[Match],
    ) -> Result<(String, usize)> {
        let template = ReplacementTemplate::parse(template, self.regex())?;
        let wanted: HashSet<(usize, usize)> = selected.iter().map(|m| (m.start, m.end)).collect();
        if wanted.is_empty() {
            return Ok((text.to_string(), 0));
        }

        Ok(self.replace_where(text, &template, |start, end| {
            wanted.contains(&(start, end))
        }))
    }

    /// `accept` 收到的是匹配在原文中的区间
    fn replace_where<F>(
        &self,
        text: &str,
        template: &ReplacementTemplate,
        mut accept: F,
    ) -> (String, usize)
    where
        F: FnMut(usize, usize) -> bool,
    {
        let mut buffer = text.to_string();
        let mut pos = 0usize;
        let mut count = 0usize;
        // 已替换部分造成的长度差
        let mut delta: isize = 0;

        loop {
            let Some((start, end, replacement)) = self
                .regex()
                .captures_at(&buffer, pos)
                .and_then(|caps| {
                    caps.get(0)
                        .map(|m| (m.start(), m.end(), template.expand(&caps)))
                })
            else {
                break;
            };

            let original_start = (start as isize - delta) as usize;
            let original_end = (end as isize - delta) as usize;
            if accept(original_start, original_end) {
                buffer.replace_range(start..end, &replacement);
                count += 1;
                pos = start + replacement.len();
                delta += replacement.len() as isize - (end - start) as isize;
            } else {
                pos = end;
            }

            if start == end {
                pos = next_char_boundary(&buffer, pos);
            }
            if pos >= buffer.len() {
                break;
            }
        }

        (buffer, count)
    }

    fn spans<'t>(&'t self, text: &'t str) -> impl Iterator<Item = (usize, usize)> + 't {
        let mut pos = 0usize;
        let mut done = false;
        std::iter::from_fn(move || {
            if done {
                return None;
            }
            let Some(m) = self.regex().find_at(text, pos) else {
                done = true;
                return None;
            };
            pos = if m.start() == m.end() {
                next_char_boundary(text, m.end())
            } else {
                m.end()
            };
            if pos > text.len() {
                done = true;
            }
            Some((m.start(), m.end()))
        })
    }
}

fn snap_to_char_boundary(text: &str, pos: usize) -> usize {
    let mut pos = pos.min(text.len());
    while !text.is_char_boundary(pos) {
        pos += 1;
    }
    pos
}

fn next_char_boundary(text: &str, pos: usize) -> usize {
    match text.get(pos..).and_then(|rest| rest.chars().next()) {
        Some(ch) => pos + ch.len_utf8(),
        None => pos + 1,
    }
}

fn to_match(text: &str, start: usize, end: usize) -> Match {
    let before = &text.as_bytes()[..start];
    let line = memchr_iter(b'\n', before).count();
    let col = match memrchr(b'\n', before) {
        Some(nl) => start - nl - 1,
        None => start,
    };
    Match::new(start, end, line, col, &text[start..end])
}

/// 按顺序递增的偏移计算行列号，避免每个匹配都从头数换行
struct LineIndex<'t> {
    text: &'t str,
    scanned: usize,
    line: usize,
    line_start: usize,
}

impl<'t> LineIndex<'t> {
    fn new(text: &'t str) -> Self {
        Self {
            text,
            scanned: 0,
            line: 0,
            line_start: 0,
        }
    }

    fn locate(&mut self, start: usize, end: usize) -> Match {
        let bytes = &self.text.as_bytes()[self.scanned..start];
        for nl in memchr_iter(b'\n', bytes) {
            self.line += 1;
            self.line_start = self.scanned + nl + 1;
        }
        self.scanned = start;
        Match::new(
            start,
            end,
            self.line,
            start - self.line_start,
            &self.text[start..end],
        )
    }
}

#[cfg(test)]
#[path = "../../../../../tests/unit/kernel/services/adapters/search/engine.rs"]
mod tests;
