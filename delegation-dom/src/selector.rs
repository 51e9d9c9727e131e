//! 选择器引擎
//!
//! 支持的语法：
//! - 复合选择器：`tag`、`*`、`#id`、`.class`、`[attr]`、`[attr=value]`（值可加引号）；
//! - 组合符：后代（空白）与子代（`>`）；
//! - 选择器列表：逗号分隔，任一匹配即可。
//!
//! `SelectorMatcher` 为注册表提供 `closest` 能力，并缓存解析结果；
//! 非法选择器视为永不匹配。
//!
use crate::document::Node;
use crate::error::DomResult;
use dashmap::DashMap;
use delegation_core::{AncestorMatcher, DomNode};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,
    #[error("unexpected character {found:?} at position {position}")]
    UnexpectedChar { position: usize, found: char },
    #[error("unexpected end of selector")]
    UnexpectedEnd,
}

/// 解析后的选择器列表
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    selectors: Vec<ComplexSelector>,
}

// compounds[i] 与 compounds[i + 1] 之间的组合符为 combinators[i]
#[derive(Debug, Clone, PartialEq, Eq)]
struct ComplexSelector {
    compounds: Vec<Compound>,
    combinators: Vec<Combinator>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    ids: Vec<String>,
    classes: Vec<String>,
    attributes: Vec<AttributeSelector>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttributeSelector {
    name: String,
    value: Option<String>,
}

impl SelectorList {
    pub fn parse(selector: &str) -> Result<Self, SelectorError> {
        Parser::new(selector).parse_list()
    }

    /// 元素自身是否匹配
    pub fn matches(&self, node: &Node) -> bool {
        node.is_element()
            && self
                .selectors
                .iter()
                .any(|s| s.matches_at(s.compounds.len() - 1, node))
    }

    /// 从 `node` 起（含自身）向上查找第一个匹配的元素；非元素节点从其元素祖先开始
    pub fn closest(&self, node: &Node) -> Option<Node> {
        let mut current = node.enclosing_element();
        while let Some(element) = current {
            if self.matches(&element) {
                return Some(element);
            }
            current = element.parent_element();
        }
        None
    }
}

impl FromStr for SelectorList {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl ComplexSelector {
    // 自右向左匹配，后代组合符需要回溯
    fn matches_at(&self, index: usize, node: &Node) -> bool {
        if !self.compounds[index].matches(node) {
            return false;
        }
        if index == 0 {
            return true;
        }

        match self.combinators[index - 1] {
            Combinator::Child => node
                .parent_element()
                .is_some_and(|parent| self.matches_at(index - 1, &parent)),
            Combinator::Descendant => {
                let mut current = node.parent_element();
                while let Some(ancestor) = current {
                    if self.matches_at(index - 1, &ancestor) {
                        return true;
                    }
                    current = ancestor.parent_element();
                }
                false
            }
        }
    }
}

impl Compound {
    fn matches(&self, node: &Node) -> bool {
        node.with_element(|tag, attributes| self.matches_element(tag, attributes))
            .unwrap_or(false)
    }

    fn matches_element(&self, tag: &str, attributes: &BTreeMap<String, String>) -> bool {
        if let Some(expected) = &self.tag {
            if expected != tag {
                return false;
            }
        }

        if !self
            .ids
            .iter()
            .all(|id| attributes.get("id").is_some_and(|v| v == id))
        {
            return false;
        }

        if !self.classes.is_empty() {
            let class_attr = attributes.get("class").map(String::as_str).unwrap_or("");
            if !self
                .classes
                .iter()
                .all(|c| class_attr.split_whitespace().any(|have| have == c))
            {
                return false;
            }
        }

        self.attributes
            .iter()
            .all(|a| match (attributes.get(&a.name), &a.value) {
                (Some(_), None) => true,
                (Some(have), Some(want)) => have == want,
                (None, _) => false,
            })
    }
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn parse_list(mut self) -> Result<SelectorList, SelectorError> {
        if self.input.trim().is_empty() {
            return Err(SelectorError::Empty);
        }

        let mut selectors = Vec::new();
        loop {
            self.skip_whitespace();
            selectors.push(self.parse_complex()?);
            match self.peek() {
                None => break,
                Some(',') => {
                    self.bump();
                }
                Some(_) => return Err(self.unexpected()),
            }
        }
        Ok(SelectorList { selectors })
    }

    fn parse_complex(&mut self) -> Result<ComplexSelector, SelectorError> {
        let mut compounds = vec![self.parse_compound()?];
        let mut combinators = Vec::new();

        loop {
            let had_space = self.skip_whitespace();
            let combinator = match self.peek() {
                None | Some(',') => break,
                Some('>') => {
                    self.bump();
                    self.skip_whitespace();
                    Combinator::Child
                }
                Some(_) if had_space => Combinator::Descendant,
                Some(_) => return Err(self.unexpected()),
            };
            combinators.push(combinator);
            compounds.push(self.parse_compound()?);
        }

        Ok(ComplexSelector {
            compounds,
            combinators,
        })
    }

    fn parse_compound(&mut self) -> Result<Compound, SelectorError> {
        let mut compound = Compound::default();
        let mut empty = true;

        match self.peek() {
            Some('*') => {
                self.bump();
                empty = false;
            }
            Some(c) if is_ident_char(c) => {
                compound.tag = Some(self.ident()?.to_ascii_lowercase());
                empty = false;
            }
            _ => {}
        }

        loop {
            match self.peek() {
                Some('#') => {
                    self.bump();
                    compound.ids.push(self.ident()?);
                }
                Some('.') => {
                    self.bump();
                    compound.classes.push(self.ident()?);
                }
                Some('[') => {
                    self.bump();
                    compound.attributes.push(self.parse_attribute()?);
                }
                _ => break,
            }
            empty = false;
        }

        if empty {
            return Err(self.unexpected());
        }
        Ok(compound)
    }

    fn parse_attribute(&mut self) -> Result<AttributeSelector, SelectorError> {
        self.skip_whitespace();
        let name = self.ident()?.to_ascii_lowercase();
        self.skip_whitespace();

        let value = match self.peek() {
            Some(']') => None,
            Some('=') => {
                self.bump();
                self.skip_whitespace();
                let value = self.parse_value()?;
                self.skip_whitespace();
                Some(value)
            }
            _ => return Err(self.unexpected()),
        };

        if self.peek() != Some(']') {
            return Err(self.unexpected());
        }
        self.bump();
        Ok(AttributeSelector { name, value })
    }

    fn parse_value(&mut self) -> Result<String, SelectorError> {
        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.bump();
                let start = self.pos;
                loop {
                    match self.bump() {
                        Some(c) if c == quote => break,
                        Some(_) => {}
                        None => return Err(SelectorError::UnexpectedEnd),
                    }
                }
                Ok(self.input[start..self.pos - quote.len_utf8()].to_owned())
            }
            _ => self.ident(),
        }
    }

    fn ident(&mut self) -> Result<String, SelectorError> {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_char) {
            self.bump();
        }
        if self.pos == start {
            return Err(self.unexpected());
        }
        Ok(self.input[start..self.pos].to_owned())
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
        self.pos > start
    }

    fn unexpected(&self) -> SelectorError {
        match self.peek() {
            Some(found) => SelectorError::UnexpectedChar {
                position: self.pos,
                found,
            },
            None => SelectorError::UnexpectedEnd,
        }
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

/// 基于选择器引擎的祖先匹配能力
///
/// 解析结果按选择器文本缓存；缓存条目数达到上限时整体清空后重新填充，
/// 因此长期反复注销、注册新选择器也不会无限增长。
#[derive(Debug)]
pub struct SelectorMatcher {
    cache: DashMap<String, Option<Arc<SelectorList>>>,
    capacity: usize,
}

const DEFAULT_CACHE_CAPACITY: usize = 256;

impl Default for SelectorMatcher {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }
}

impl SelectorMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// 指定缓存上限（至少为 1）
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cache: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// 当前缓存的选择器数量
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    fn compiled(&self, selector: &str) -> Option<Arc<SelectorList>> {
        if let Some(entry) = self.cache.get(selector) {
            return entry.value().clone();
        }

        let compiled = match SelectorList::parse(selector) {
            Ok(list) => Some(Arc::new(list)),
            Err(err) => {
                debug!(selector, error = %err, "invalid selector never matches");
                None
            }
        };

        if self.cache.len() >= self.capacity {
            debug!(capacity = self.capacity, "selector cache full, clearing");
            self.cache.clear();
        }
        self.cache.insert(selector.to_owned(), compiled.clone());
        compiled
    }
}

impl AncestorMatcher<Node> for SelectorMatcher {
    fn closest(&self, element: &Node, selector: &str) -> Option<Node> {
        self.compiled(selector)?.closest(element)
    }
}

impl Node {
    /// 与 DOM 的 `Element.closest` 一致，非法选择器返回错误
    pub fn closest(&self, selector: &str) -> DomResult<Option<Node>> {
        Ok(SelectorList::parse(selector)?.closest(self))
    }

    pub fn matches(&self, selector: &str) -> DomResult<bool> {
        Ok(SelectorList::parse(selector)?.matches(self))
    }
}
