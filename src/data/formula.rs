//! Design formulas.
//!
//! Only additive main-effect designs are supported: `~ a + b`, with an
//! implicit intercept that `0 +` or `-1 +` removes. Names may be
//! back-quoted to carry spaces or operator characters, as in
//! `` ~ `Lane ID` + `Category` ``.

use crate::error::{IobioError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A term in a formula.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Term {
    /// Intercept term (constant).
    Intercept,
    /// Main effect of a variable.
    Main(String),
}

impl Term {
    /// Variable named by this term, if any.
    pub fn variable(&self) -> Option<&str> {
        match self {
            Term::Intercept => None,
            Term::Main(v) => Some(v),
        }
    }
}

impl std::fmt::Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Term::Intercept => write!(f, "1"),
            Term::Main(v) => write!(f, "`{}`", v),
        }
    }
}

/// A parsed design formula.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Formula {
    /// Whether to include an intercept.
    pub intercept: bool,
    /// Main-effect terms, in formula order.
    pub terms: Vec<Term>,
}

impl Formula {
    /// Parse a formula string.
    ///
    /// # Examples
    /// ```
    /// use iobio::data::Formula;
    /// let f = Formula::parse("~ `batch` + `Category`").unwrap();
    /// assert!(f.intercept);
    /// assert_eq!(f.variables(), vec!["batch", "Category"]);
    /// ```
    pub fn parse(formula: &str) -> Result<Self> {
        let rhs = formula
            .trim()
            .strip_prefix('~')
            .ok_or_else(|| IobioError::FormulaParse(format!("'{}' does not start with '~'", formula)))?;

        let bare = Regex::new(r"^[A-Za-z_.][A-Za-z0-9_.]*$").map_err(|e| IobioError::FormulaParse(e.to_string()))?;

        let mut intercept = true;
        let mut terms = Vec::new();
        for (i, token) in split_terms(rhs)?.into_iter().enumerate() {
            match token {
                Token::Quoted(name) if name.trim().is_empty() => {
                    return Err(IobioError::FormulaParse("empty back-quoted name".to_string()));
                }
                Token::Quoted(name) => push_unique(&mut terms, name),
                Token::Bare(text) => match text.as_str() {
                    "1" => {}
                    "0" | "-1" if i == 0 => intercept = false,
                    _ if bare.is_match(&text) => push_unique(&mut terms, text),
                    _ => {
                        return Err(IobioError::FormulaParse(format!(
                            "unsupported term '{}' (only additive main effects are allowed)",
                            text
                        )))
                    }
                },
            }
        }

        if terms.is_empty() {
            return Err(IobioError::FormulaParse(format!("'{}' has no variables", formula)));
        }
        Ok(Self { intercept, terms })
    }

    /// Design formula for a category comparison with an optional batch term.
    ///
    /// Batch comes first so the category coefficient is the last one.
    pub fn for_comparison(category: &str, batch: Option<&str>) -> Result<Self> {
        let mut terms = Vec::with_capacity(2);
        if let Some(batch) = batch {
            if batch == category {
                return Err(IobioError::FormulaParse(format!(
                    "batch and category are the same column '{}'",
                    category
                )));
            }
            terms.push(Term::Main(batch.to_string()));
        }
        terms.push(Term::Main(category.to_string()));
        Ok(Self { intercept: true, terms })
    }

    /// Variable names, in formula order.
    pub fn variables(&self) -> Vec<&str> {
        self.terms.iter().filter_map(Term::variable).collect()
    }
}

impl std::fmt::Display for Formula {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "~ ")?;
        if !self.intercept {
            write!(f, "0 + ")?;
        }
        let terms: Vec<String> = self.terms.iter().map(Term::to_string).collect();
        write!(f, "{}", terms.join(" + "))
    }
}

enum Token {
    Quoted(String),
    Bare(String),
}

/// Split a right-hand side on `+`, keeping back-quoted names whole.
fn split_terms(rhs: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = rhs.chars().peekable();
    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}

        let token = if chars.next_if_eq(&'`').is_some() {
            let name: String = chars.by_ref().take_while(|&c| c != '`').collect();
            Token::Quoted(name)
        } else {
            let mut text = String::new();
            while let Some(c) = chars.next_if(|&c| c != '+') {
                text.push(c);
            }
            let text = text.trim_end().to_string();
            if text.is_empty() {
                return Err(IobioError::FormulaParse(format!("empty term in '~{}'", rhs)));
            }
            Token::Bare(text)
        };
        tokens.push(token);

        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        match chars.next() {
            None => break,
            Some('+') => continue,
            Some(c) => {
                return Err(IobioError::FormulaParse(format!(
                    "unexpected '{}' after a term in '~{}'",
                    c, rhs
                )))
            }
        }
    }
    Ok(tokens)
}

fn push_unique(terms: &mut Vec<Term>, name: String) {
    let term = Term::Main(name);
    if !terms.contains(&term) {
        terms.push(term);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let f = Formula::parse("~ group").unwrap();
        assert!(f.intercept);
        assert_eq!(f.terms, vec![Term::Main("group".to_string())]);
    }

    #[test]
    fn test_parse_quoted_with_operators() {
        let f = Formula::parse("~ `Lane + Flowcell` + `Sample Type`").unwrap();
        assert_eq!(f.variables(), vec!["Lane + Flowcell", "Sample Type"]);
    }

    #[test]
    fn test_parse_no_intercept() {
        let f = Formula::parse("~ 0 + group").unwrap();
        assert!(!f.intercept);
        assert_eq!(f.terms.len(), 1);
        assert!(!Formula::parse("~ -1 + group").unwrap().intercept);
    }

    #[test]
    fn test_duplicate_terms_collapse() {
        let f = Formula::parse("~ a + `a` + 1").unwrap();
        assert_eq!(f.variables(), vec!["a"]);
    }

    #[test]
    fn test_for_comparison() {
        let f = Formula::for_comparison("Category", Some("Batch")).unwrap();
        assert_eq!(f.to_string(), "~ `Batch` + `Category`");
        assert_eq!(f.terms.last(), Some(&Term::Main("Category".to_string())));
        assert_eq!(Formula::parse(&f.to_string()).unwrap(), f);

        let f = Formula::for_comparison("Category", None).unwrap();
        assert_eq!(f.terms, vec![Term::Main("Category".to_string())]);
        assert!(Formula::for_comparison("Category", Some("Category")).is_err());
    }

    #[test]
    fn test_invalid_formula() {
        assert!(Formula::parse("group + age").is_err());
        assert!(Formula::parse("~").is_err());
        assert!(Formula::parse("~ 0").is_err());
        assert!(Formula::parse("~ a + ").is_err());
        assert!(Formula::parse("~ a * b").is_err());
        assert!(Formula::parse("~ a:b").is_err());
        assert!(Formula::parse("~ ``").is_err());
        assert!(Formula::parse("~ `a` b").is_err());
    }
}
