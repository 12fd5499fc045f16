use heck::{ToKebabCase, ToLowerCamelCase, ToPascalCase, ToShoutySnakeCase, ToSnakeCase};
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::sync::OnceLock;
use uuid::Uuid;

/// Namespace for the deterministic `<Key>Uuid` variant.
const STITCHGEN_NS_NAME: &str = "io.github.stitchgen";

/// Suffixes appended to a primary key for each derived variant, paired with
/// the function that derives it.
const VARIANTS: &[(&str, fn(&str) -> String)] = &[
    ("PascalCase", pascalcase),
    ("CamelCase", camelcase),
    ("KebabCase", kebabcase),
    ("LowerCase", lowercase),
    ("SnakeCase", snakecase),
    ("ScreamingSnakeCase", screamingsnakecase),
    ("Uuid", uuid_generate),
];

pub fn pascalcase(s: &str) -> String {
    s.to_pascal_case()
}

pub fn camelcase(s: &str) -> String {
    s.to_lower_camel_case()
}

pub fn kebabcase(s: &str) -> String {
    s.to_kebab_case()
}

/// Lowercased with everything but letters and digits dropped: `Foo Bar` -> `foobar`.
pub fn lowercase(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

pub fn snakecase(s: &str) -> String {
    s.to_snake_case()
}

pub fn screamingsnakecase(s: &str) -> String {
    s.to_shouty_snake_case()
}

/// A UUIDv5 of `s`, stable across runs so regenerated files do not churn.
pub fn uuid_generate(s: &str) -> String {
    let ns = Uuid::new_v5(&Uuid::NAMESPACE_DNS, STITCHGEN_NS_NAME.as_bytes());
    Uuid::new_v5(&ns, s.as_bytes()).to_string()
}

fn placeholder_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    // {{.Name}} with optional inner whitespace
    REGEX.get_or_init(|| {
        Regex::new(r"\{\{\s*\.([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("Invalid regex")
    })
}

/// Placeholder values keyed by variable name.
///
/// Values inserted with [`Placeholders::insert_with_variants`] also expose
/// the derived casings under `<Key><Suffix>` keys, e.g. `Name` = `foo bar`
/// yields `NamePascalCase` = `FooBar` and `NameKebabCase` = `foo-bar`.
/// Explicitly inserted keys always take precedence over derived ones.
#[derive(Debug, Clone, Default)]
pub struct Placeholders {
    values: BTreeMap<String, String>,
    explicit: BTreeMap<String, String>,
}

impl Placeholders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a map where every pair gets its derived variants.
    pub fn from_primary<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut placeholders = Self::new();
        for (key, value) in pairs {
            placeholders.insert_with_variants(key, value);
        }
        placeholders
    }

    /// Sets `key` to exactly `value`, without derived variants.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let (key, value) = (key.into(), value.into());
        self.values.insert(key.clone(), value.clone());
        self.explicit.insert(key, value);
    }

    /// Sets `key` to `value` and derives every casing variant from it.
    pub fn insert_with_variants(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let (key, value) = (key.into(), value.into());
        for (suffix, derive) in VARIANTS {
            let derived_key = format!("{}{}", key, suffix);
            if !self.explicit.contains_key(&derived_key) {
                self.values.insert(derived_key, derive(&value));
            }
        }
        self.insert(key, value);
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Replaces every known `{{.Key}}` token in `input`. Unknown tokens are
    /// left untouched.
    pub fn substitute(&self, input: &str) -> String {
        if !input.contains("{{") {
            return input.to_string();
        }
        placeholder_regex()
            .replace_all(input, |caps: &Captures| match self.get(&caps[1]) {
                Some(value) => value.to_string(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variants() {
        let p = Placeholders::from_primary([("Name", "FooBar")]);
        assert_eq!(p.get("Name"), Some("FooBar"));
        assert_eq!(p.get("NamePascalCase"), Some("FooBar"));
        assert_eq!(p.get("NameCamelCase"), Some("fooBar"));
        assert_eq!(p.get("NameKebabCase"), Some("foo-bar"));
        assert_eq!(p.get("NameLowerCase"), Some("foobar"));
        assert_eq!(p.get("NameSnakeCase"), Some("foo_bar"));
        assert_eq!(p.get("NameScreamingSnakeCase"), Some("FOO_BAR"));
    }

    #[test]
    fn test_variants_from_spaced_value() {
        let p = Placeholders::from_primary([("Title", "blog post")]);
        assert_eq!(p.get("TitlePascalCase"), Some("BlogPost"));
        assert_eq!(p.get("TitleLowerCase"), Some("blogpost"));
    }

    #[test]
    fn test_uuid_is_deterministic() {
        let a = Placeholders::from_primary([("Name", "FooBar")]);
        let b = Placeholders::from_primary([("Name", "FooBar")]);
        assert_eq!(a.get("NameUuid"), b.get("NameUuid"));
        assert_ne!(a.get("NameUuid"), Some(uuid_generate("Other").as_str()));
    }

    #[test]
    fn test_explicit_key_wins_over_derived() {
        let mut p = Placeholders::new();
        p.insert("NameKebabCase", "custom");
        p.insert_with_variants("Name", "FooBar");
        assert_eq!(p.get("NameKebabCase"), Some("custom"));
        assert_eq!(p.get("NameCamelCase"), Some("fooBar"));
    }

    #[test]
    fn test_substitute() {
        let p = Placeholders::from_primary([("Name", "FooBar")]);
        assert_eq!(
            p.substitute("src/{{.NameKebabCase}}/{{ .Name }}.tsx"),
            "src/foo-bar/FooBar.tsx"
        );
    }

    #[test]
    fn test_substitute_leaves_unknown_tokens() {
        let p = Placeholders::from_primary([("Name", "FooBar")]);
        let input = "{{.Missing}} {{ name }} {{.Name}} {{";
        assert_eq!(p.substitute(input), "{{.Missing}} {{ name }} FooBar {{");
    }
}
