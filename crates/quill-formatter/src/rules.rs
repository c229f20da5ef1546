//! Formatting rules
//!
//! A rule binds a directive fragment to a scope pattern, optionally
//! restricted by an ancestry pattern. Rules are indexed by the final
//! segment of their scope; at render time all rules matching a node's
//! scope chain are merged from least to most specific into one directive.
//!
//! Matching is suffix based in both dimensions. A rule scope of
//! `punctuation.comma` matches the scope name `constant.punctuation.comma`,
//! and an ancestry entry matches any ancestor scope name that ends in the
//! given segments. Specificity orders by scope segment count, then
//! ancestry length, then scope string length, then declaration order.

use std::collections::HashMap;

use crate::scope::ScopeChain;

/// Which side of a token an effect applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Fully resolved formatting behavior for one node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Directive {
    /// Emit a space before the token
    pub left_padding: bool,
    /// Emit a space after the token
    pub right_padding: bool,
    /// Token starts an indented block: indent and break after it
    pub opens_block: bool,
    /// Token ends an indented block: dedent and break before it
    pub closes_block: bool,
    /// Token separates block content; breaks on the given side when the
    /// enclosing block is broken, pads when it is inline
    pub divider: Option<Side>,
    /// Minimum newlines after the token (0, 1 or 2)
    pub line_break_after: u8,
    /// Node delimits a region with its own inline decision
    pub is_container: bool,
    /// Container never renders inline
    pub ignore_inline: bool,
    /// Container does not force a break after it closes
    pub skip_post_container_newline: bool,
    /// Token retracts any pending line breaks so it hugs what came before
    pub clear_trailing: bool,
}

/// A partial directive; unset fields defer to less specific rules
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectiveFragment {
    left_padding: Option<bool>,
    right_padding: Option<bool>,
    opens_block: Option<bool>,
    closes_block: Option<bool>,
    divider: Option<Option<Side>>,
    line_break_after: Option<u8>,
    is_container: Option<bool>,
    ignore_inline: Option<bool>,
    skip_post_container_newline: Option<bool>,
    clear_trailing: Option<bool>,
}

impl DirectiveFragment {
    fn new() -> Self {
        Self::default()
    }

    fn padded(mut self) -> Self {
        self.left_padding = Some(true);
        self.right_padding = Some(true);
        self
    }

    fn pad_left(mut self) -> Self {
        self.left_padding = Some(true);
        self
    }

    fn pad_right(mut self) -> Self {
        self.right_padding = Some(true);
        self
    }

    fn unpadded(mut self) -> Self {
        self.left_padding = Some(false);
        self.right_padding = Some(false);
        self
    }

    fn opener(mut self) -> Self {
        self.opens_block = Some(true);
        self
    }

    fn closer(mut self) -> Self {
        self.closes_block = Some(true);
        self
    }

    fn no_anchors(mut self) -> Self {
        self.opens_block = Some(false);
        self.closes_block = Some(false);
        self
    }

    fn divider(mut self, side: Side) -> Self {
        self.divider = Some(Some(side));
        self
    }

    fn line_break(mut self) -> Self {
        self.line_break_after = Some(1);
        self
    }

    fn double_line_break(mut self) -> Self {
        self.line_break_after = Some(2);
        self
    }

    fn container(mut self) -> Self {
        self.is_container = Some(true);
        self
    }

    fn ignore_inline(mut self) -> Self {
        self.ignore_inline = Some(true);
        self
    }

    fn skip_post_container_newline(mut self) -> Self {
        self.skip_post_container_newline = Some(true);
        self
    }

    fn clear_trailing(mut self) -> Self {
        self.clear_trailing = Some(true);
        self
    }

    fn apply_to(&self, directive: &mut Directive) {
        if let Some(v) = self.left_padding {
            directive.left_padding = v;
        }
        if let Some(v) = self.right_padding {
            directive.right_padding = v;
        }
        if let Some(v) = self.opens_block {
            directive.opens_block = v;
        }
        if let Some(v) = self.closes_block {
            directive.closes_block = v;
        }
        if let Some(v) = self.divider {
            directive.divider = v;
        }
        if let Some(v) = self.line_break_after {
            directive.line_break_after = v;
        }
        if let Some(v) = self.is_container {
            directive.is_container = v;
        }
        if let Some(v) = self.ignore_inline {
            directive.ignore_inline = v;
        }
        if let Some(v) = self.skip_post_container_newline {
            directive.skip_post_container_newline = v;
        }
        if let Some(v) = self.clear_trailing {
            directive.clear_trailing = v;
        }
    }
}

/// One formatting rule
#[derive(Debug, Clone)]
pub struct Rule {
    /// Dotted scope pattern, matched as a segment suffix
    scope: &'static str,
    /// Ancestor scope patterns, nearest first, each matched as a suffix
    ancestry: &'static [&'static str],
    fragment: DirectiveFragment,
}

impl Rule {
    fn new(scope: &'static str, ancestry: &'static [&'static str], fragment: DirectiveFragment) -> Self {
        Self {
            scope,
            ancestry,
            fragment,
        }
    }
}

/// The rule table, indexed by final scope segment
pub struct RuleSet {
    rules: Vec<Rule>,
    by_tail: HashMap<&'static str, Vec<usize>>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        let mut by_tail: HashMap<&'static str, Vec<usize>> = HashMap::new();
        for (index, rule) in rules.iter().enumerate() {
            let tail = rule.scope.rsplit('.').next().unwrap_or(rule.scope);
            by_tail.entry(tail).or_default().push(index);
        }
        Self { rules, by_tail }
    }

    /// The built-in rule table
    pub fn with_defaults() -> Self {
        Self::new(default_rules())
    }

    /// Merge every rule matching the chain into one directive
    pub fn resolve(&self, chain: &ScopeChain) -> Directive {
        let mut directive = Directive::default();
        let Some(name) = chain.current() else {
            return directive;
        };

        let tail = name.rsplit('.').next().unwrap_or(name);
        let Some(indices) = self.by_tail.get(tail) else {
            return directive;
        };

        let mut matched: Vec<(usize, usize, usize, usize)> = Vec::new();
        for &index in indices {
            let rule = &self.rules[index];
            if !segment_suffix_matches(rule.scope, name) {
                continue;
            }
            if !ancestry_matches(rule.ancestry, chain) {
                continue;
            }
            matched.push((
                rule.scope.split('.').count(),
                rule.ancestry.len(),
                rule.scope.len(),
                index,
            ));
        }

        // least specific first, so later fragments override earlier ones
        matched.sort();
        for (_, _, _, index) in matched {
            self.rules[index].fragment.apply_to(&mut directive);
        }
        directive
    }
}

/// Whether `pattern`'s dotted segments are a suffix of `name`'s
fn segment_suffix_matches(pattern: &str, name: &str) -> bool {
    let mut pattern_segments = pattern.rsplit('.');
    let mut name_segments = name.rsplit('.');
    loop {
        match (pattern_segments.next(), name_segments.next()) {
            (None, _) => return true,
            (Some(_), None) => return false,
            (Some(p), Some(n)) if p != n => return false,
            _ => {}
        }
    }
}

/// The i-th ancestry pattern must match the i-th nearest ancestor
fn ancestry_matches(ancestry: &[&str], chain: &ScopeChain) -> bool {
    let mut ancestors = chain.names().skip(1);
    ancestry.iter().all(|pattern| {
        ancestors
            .next()
            .is_some_and(|name| segment_suffix_matches(pattern, name))
    })
}

fn default_rules() -> Vec<Rule> {
    fn f() -> DirectiveFragment {
        DirectiveFragment::new()
    }

    vec![
        // containers
        Rule::new("list", &[], f().container()),
        Rule::new("record", &[], f().container()),
        Rule::new("invoke", &[], f().container()),
        Rule::new("parameters", &[], f().container()),
        Rule::new("item-access", &[], f().container()),
        Rule::new("paren", &[], f().container()),
        Rule::new("function", &[], f().container()),
        Rule::new("each", &[], f().container()),
        Rule::new("try", &[], f().container()),
        Rule::new("error", &[], f().container()),
        Rule::new("arithmetic", &[], f().container()),
        Rule::new("equality", &[], f().container()),
        Rule::new("relational", &[], f().container()),
        Rule::new("logical", &[], f().container()),
        Rule::new("coalesce", &[], f().container()),
        Rule::new("is", &[], f().container()),
        Rule::new("as", &[], f().container()),
        Rule::new("meta", &[], f().container()),
        // these render one way only, so the inline probe is skipped
        Rule::new("let", &[], f().container().ignore_inline()),
        Rule::new("if", &[], f().container().ignore_inline()),
        Rule::new("section", &[], f().container().ignore_inline()),
        Rule::new("section-member", &[], f().container().ignore_inline()),
        //
        // bracket anchors
        Rule::new("punctuation.open-brace", &["list"], f().opener()),
        Rule::new("punctuation.close-brace", &["list"], f().closer()),
        Rule::new("punctuation.open-bracket", &["record"], f().opener()),
        Rule::new("punctuation.close-bracket", &["record"], f().closer()),
        Rule::new("punctuation.open-paren", &["invoke"], f().opener()),
        Rule::new("punctuation.close-paren", &["invoke"], f().closer()),
        Rule::new("punctuation.open-paren", &["parameters"], f().opener()),
        Rule::new("punctuation.close-paren", &["parameters"], f().closer()),
        Rule::new("punctuation.open-paren", &["paren"], f().opener()),
        Rule::new("punctuation.close-paren", &["paren"], f().closer()),
        Rule::new("punctuation.open-brace", &["item-access"], f().opener()),
        Rule::new("punctuation.close-brace", &["item-access"], f().closer()),
        // a block-rendered callee or item-access head hugs its postfix
        // bracket instead of forcing the bracket onto the next line
        Rule::new("paren", &["invoke"], f().skip_post_container_newline()),
        Rule::new("invoke", &["invoke"], f().skip_post_container_newline()),
        Rule::new("paren", &["item-access"], f().skip_post_container_newline()),
        Rule::new("invoke", &["item-access"], f().skip_post_container_newline()),
        // type literals render inline; their brackets anchor nothing,
        // overriding the list/record rules that `type.list`/`type.record`
        // would otherwise suffix-match
        Rule::new("punctuation.open-brace", &["type.list"], f().no_anchors()),
        Rule::new("punctuation.close-brace", &["type.list"], f().no_anchors()),
        Rule::new("punctuation.open-bracket", &["type.record"], f().no_anchors()),
        Rule::new("punctuation.close-bracket", &["type.record"], f().no_anchors()),
        //
        // separators
        Rule::new(
            "punctuation.comma",
            &[],
            f().divider(Side::Right).clear_trailing(),
        ),
        Rule::new(
            "punctuation.semicolon",
            &["section"],
            f().double_line_break().clear_trailing(),
        ),
        Rule::new(
            "punctuation.semicolon",
            &["section-member"],
            f().line_break().clear_trailing(),
        ),
        //
        // keyword anchors inside always-broken constructs
        Rule::new("keyword.let", &["let"], f().pad_right().opener()),
        Rule::new("keyword.in", &["let"], f().padded().closer().opener()),
        Rule::new("keyword.then", &["if"], f().padded().opener()),
        Rule::new("keyword.else", &["if"], f().padded().closer().opener()),
        Rule::new("operator.arrow", &["function"], f().padded().opener()),
        //
        // keyword padding
        Rule::new("keyword.if", &[], f().pad_right()),
        Rule::new("keyword.each", &[], f().pad_right()),
        Rule::new("keyword.try", &[], f().pad_right()),
        Rule::new("keyword.otherwise", &[], f().padded()),
        Rule::new("keyword.error", &[], f().pad_right()),
        Rule::new("keyword.section", &[], f().pad_right()),
        Rule::new("keyword.shared", &[], f().pad_right()),
        Rule::new("keyword.type", &[], f().pad_right()),
        Rule::new("keyword.nullable", &[], f().pad_right()),
        Rule::new("keyword.optional", &[], f().pad_right()),
        //
        // operator padding
        Rule::new("operator.plus", &[], f().padded()),
        Rule::new("operator.minus", &[], f().padded()),
        Rule::new("operator.star", &[], f().padded()),
        Rule::new("operator.slash", &[], f().padded()),
        Rule::new("operator.ampersand", &[], f().padded()),
        Rule::new("operator.equals", &[], f().padded()),
        Rule::new("operator.not-equals", &[], f().padded()),
        Rule::new("operator.less", &[], f().padded()),
        Rule::new("operator.less-equals", &[], f().padded()),
        Rule::new("operator.greater", &[], f().padded()),
        Rule::new("operator.greater-equals", &[], f().padded()),
        Rule::new("operator.coalesce", &[], f().padded()),
        Rule::new("operator.and", &[], f().padded()),
        Rule::new("operator.or", &[], f().padded()),
        Rule::new("operator.not", &[], f().pad_right()),
        Rule::new("operator.as", &[], f().padded()),
        Rule::new("operator.is", &[], f().padded()),
        Rule::new("operator.meta", &[], f().padded()),
        //
        // unary sign operators hug their operand
        Rule::new("operator.plus", &["unary"], f().unpadded()),
        Rule::new("operator.minus", &["unary"], f().unpadded()),
        //
        // broken operator chains put the operator at the head of the
        // continuation line
        Rule::new("operator.plus", &["arithmetic"], f().divider(Side::Left)),
        Rule::new("operator.minus", &["arithmetic"], f().divider(Side::Left)),
        Rule::new("operator.star", &["arithmetic"], f().divider(Side::Left)),
        Rule::new("operator.slash", &["arithmetic"], f().divider(Side::Left)),
        Rule::new(
            "operator.ampersand",
            &["arithmetic"],
            f().divider(Side::Left),
        ),
        Rule::new("operator.equals", &["equality"], f().divider(Side::Left)),
        Rule::new(
            "operator.not-equals",
            &["equality"],
            f().divider(Side::Left),
        ),
        Rule::new("operator.less", &["relational"], f().divider(Side::Left)),
        Rule::new(
            "operator.less-equals",
            &["relational"],
            f().divider(Side::Left),
        ),
        Rule::new("operator.greater", &["relational"], f().divider(Side::Left)),
        Rule::new(
            "operator.greater-equals",
            &["relational"],
            f().divider(Side::Left),
        ),
        Rule::new("operator.and", &["logical"], f().divider(Side::Left)),
        Rule::new("operator.or", &["logical"], f().divider(Side::Left)),
        Rule::new("operator.coalesce", &["coalesce"], f().divider(Side::Left)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::borrow::Cow;

    // arrays are written nearest-first, the way `ScopeChain::names`
    // yields them, so the chain is built from the far end
    fn chain(names: &[&'static str]) -> ScopeChain {
        names.iter().rev().fold(ScopeChain::root(), |chain, &name| {
            chain.push(Cow::Borrowed(name))
        })
    }

    #[test]
    fn test_suffix_matching() {
        assert!(segment_suffix_matches(
            "punctuation.comma",
            "constant.punctuation.comma"
        ));
        assert!(segment_suffix_matches("comma", "constant.punctuation.comma"));
        assert!(!segment_suffix_matches(
            "keyword.comma",
            "constant.punctuation.comma"
        ));
        // suffix match works on whole segments, not substrings
        assert!(!segment_suffix_matches("brace", "open-brace"));
    }

    #[test]
    fn test_unmatched_scope_gets_default() {
        let rules = RuleSet::with_defaults();
        let directive = rules.resolve(&chain(&["literal.number", "csv", "list"]));
        assert_eq!(directive, Directive::default());
    }

    #[test]
    fn test_comma_is_a_divider_everywhere() {
        let rules = RuleSet::with_defaults();
        let directive = rules.resolve(&chain(&[
            "constant.punctuation.comma",
            "csv",
            "elements",
            "invoke",
        ]));
        assert_eq!(directive.divider, Some(Side::Right));
        assert!(directive.clear_trailing);
    }

    #[rstest]
    #[case(&["constant.punctuation.open-brace", "list"], true)]
    #[case(&["constant.punctuation.open-brace", "item-access"], true)]
    #[case(&["constant.punctuation.open-brace", "type.list"], false)]
    fn test_brace_opener_requires_ancestry(
        #[case] names: &[&'static str],
        #[case] opens: bool,
    ) {
        let rules = RuleSet::with_defaults();
        assert_eq!(rules.resolve(&chain(names)).opens_block, opens);
    }

    #[test]
    fn test_ancestry_specific_rule_overrides_generic() {
        let rules = RuleSet::with_defaults();
        // binary minus pads, unary minus hugs
        let binary = rules.resolve(&chain(&["constant.operator.minus", "arithmetic"]));
        assert!(binary.left_padding && binary.right_padding);
        assert_eq!(binary.divider, Some(Side::Left));
        let unary = rules.resolve(&chain(&["constant.operator.minus", "unary"]));
        assert!(!unary.left_padding && !unary.right_padding);
        assert_eq!(unary.divider, None);
    }

    #[test]
    fn test_section_semicolons_differ_by_position() {
        let rules = RuleSet::with_defaults();
        let header = rules.resolve(&chain(&["constant.punctuation.semicolon", "section"]));
        assert_eq!(header.line_break_after, 2);
        let member = rules.resolve(&chain(&[
            "constant.punctuation.semicolon",
            "section-member",
            "section",
        ]));
        assert_eq!(member.line_break_after, 1);
    }

    #[test]
    fn test_let_keywords() {
        let rules = RuleSet::with_defaults();
        let let_kw = rules.resolve(&chain(&["constant.keyword.let", "let"]));
        assert!(let_kw.opens_block && !let_kw.closes_block);
        let in_kw = rules.resolve(&chain(&["constant.keyword.in", "let"]));
        assert!(in_kw.opens_block && in_kw.closes_block);
    }
}
