//! Naming policy
//!
//! Turns arbitrary source names (schema keys, media types, paths, tags) into
//! identifiers that both targets accept.

#[derive(Clone, Copy, PartialEq)]
enum CharClass {
    Upper,
    Lower,
    Digit,
}

fn classify(c: char) -> Option<CharClass> {
    if c.is_ascii_uppercase() {
        Some(CharClass::Upper)
    } else if c.is_ascii_lowercase() {
        Some(CharClass::Lower)
    } else if c.is_ascii_digit() {
        Some(CharClass::Digit)
    } else {
        None
    }
}

/// Split a name into words.
///
/// Boundaries are any non-alphanumeric character, a lower-to-upper or
/// digit-to-letter transition, and the last capital of an acronym run that
/// is followed by a lowercase letter (`HTTPServer` -> `HTTP`, `Server`).
/// A letter followed by a digit stays in the same word (`v2`, `Response200`).
pub fn split_words(name: &str) -> Vec<String> {
    let chars: Vec<char> = name.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        let Some(class) = classify(c) else {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        };

        if let Some(prev) = current.chars().last().and_then(classify) {
            let next = chars.get(i + 1).copied().and_then(classify);
            let boundary = match (prev, class) {
                (CharClass::Lower, CharClass::Upper) => true,
                (CharClass::Digit, CharClass::Upper | CharClass::Lower) => true,
                (CharClass::Upper, CharClass::Upper) => next == Some(CharClass::Lower),
                _ => false,
            };
            if boundary {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }

    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase(),
        None => String::new(),
    }
}

/// Convert to PascalCase (`pet_status` -> `PetStatus`)
///
/// # Examples
/// ```
/// use openapi2idl_common::naming::to_pascal_case;
///
/// assert_eq!(to_pascal_case("pet_status"), "PetStatus");
/// assert_eq!(to_pascal_case("HTTPServer"), "HttpServer");
/// assert_eq!(to_pascal_case(&to_pascal_case("get-user by id")), "GetUserById");
/// assert_eq!(to_pascal_case("a_b1"), "Ab1");
/// ```
///
/// A single-letter word is joined with a following word that would otherwise
/// read back as part of an acronym run (`a_b1` is `Ab1`, not `AB1`), which
/// keeps the conversion idempotent.
pub fn to_pascal_case(name: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    for word in split_words(name) {
        match words.last_mut() {
            Some(last) if is_single_letter(last) && joins_acronym(&word) => last.push_str(&word),
            _ => words.push(word),
        }
    }
    words.iter().map(|w| capitalize(w)).collect()
}

fn is_single_letter(word: &str) -> bool {
    word.len() == 1 && word.chars().all(|c| c.is_ascii_alphabetic())
}

/// Capitalized, `word` leaves no lowercase letter right after its first character
fn joins_acronym(word: &str) -> bool {
    let mut chars = word.chars();
    match (chars.next(), chars.next()) {
        (Some(first), None) => first.is_ascii_alphabetic(),
        (Some(first), Some(second)) => first.is_ascii_alphabetic() && second.is_ascii_digit(),
        _ => false,
    }
}

/// Convert to snake_case (`petStatus` -> `pet_status`)
///
/// # Examples
/// ```
/// use openapi2idl_common::naming::to_snake_case;
///
/// assert_eq!(to_snake_case("petStatus"), "pet_status");
/// assert_eq!(to_snake_case("X-Request-ID"), "x_request_id");
/// ```
pub fn to_snake_case(name: &str) -> String {
    split_words(name)
        .iter()
        .map(|w| w.to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join("_")
}

/// Uppercase the first character, leaving the rest untouched
pub fn upper_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Replace spaces, slashes and dashes with `_`, then drop every character
/// outside `[A-Za-z0-9_]`.
pub fn sanitize(name: &str) -> String {
    name.chars()
        .filter_map(|c| match c {
            ' ' | '/' | '-' => Some('_'),
            c if c.is_ascii_alphanumeric() || c == '_' => Some(c),
            _ => None,
        })
        .collect()
}

/// Build an identifier from a URL path, one PascalCase word group per segment
///
/// `/item/{id}` becomes `ItemId`.
pub fn path_to_pascal(path: &str) -> String {
    path.split('/')
        .map(|segment| to_pascal_case(segment.trim_matches(|c| c == '{' || c == '}')))
        .collect()
}

/// Rewrite `{param}` placeholders into the `:param` form used by the binding options
pub fn convert_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some(param) if !param.is_empty() => format!(":{}", param),
                _ => segment.to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Whether `name` is a plain identifier: `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Naming convention switch applied to every emitted name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamingPolicy {
    /// When false only the first letter is uppercased
    pub enabled: bool,
}

impl Default for NamingPolicy {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl NamingPolicy {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Name of a declaration, service or method
    pub fn type_name(&self, raw: &str) -> String {
        if self.enabled {
            to_pascal_case(raw)
        } else {
            upper_first(&sanitize(raw))
        }
    }

    /// Name of a field
    pub fn field_name(&self, raw: &str) -> String {
        if self.enabled {
            to_snake_case(raw)
        } else {
            upper_first(&sanitize(raw))
        }
    }

    /// Name of a declaration synthesized for `child` inside `parent`
    pub fn compose(&self, parent: Option<&str>, child: &str) -> String {
        match parent {
            Some(parent) => self.type_name(&format!("{}{}", parent, upper_first(child))),
            None => self.type_name(child),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: &[&str] = &[
        "pet",
        "petStatus",
        "PetStatus",
        "pet_status",
        "pet-status",
        "HTTPServer",
        "getUserByID",
        "application/json",
        "X-Request-ID",
        "v2Items",
        "Response200",
        "  spaced  name ",
        "already_snake_case",
        "item.sub.type",
        "a_b1",
        "x_v2",
        "a_b",
        "get_a",
        "a_get",
        "x_a_b2c",
    ];

    #[test]
    fn test_split_words() {
        assert_eq!(split_words("HTTPServer"), vec!["HTTP", "Server"]);
        assert_eq!(split_words("petStatus"), vec!["pet", "Status"]);
        assert_eq!(split_words("v2Items"), vec!["v2", "Items"]);
        assert_eq!(split_words("a.b-c_d e"), vec!["a", "b", "c", "d", "e"]);
        assert!(split_words("--").is_empty());
    }

    #[test]
    fn test_pascal_case() {
        assert_eq!(to_pascal_case("pet"), "Pet");
        assert_eq!(to_pascal_case("pet_status"), "PetStatus");
        assert_eq!(to_pascal_case("getUserByID"), "GetUserById");
        assert_eq!(to_pascal_case("application/json"), "ApplicationJson");
    }

    #[test]
    fn test_pascal_case_joins_single_letters() {
        assert_eq!(to_pascal_case("a_b1"), "Ab1");
        assert_eq!(to_pascal_case("x_v2"), "Xv2");
        assert_eq!(to_pascal_case("a_b"), "Ab");
        assert_eq!(to_pascal_case("get_a"), "GetA");
        assert_eq!(to_pascal_case("a_get"), "AGet");
        assert_eq!(to_pascal_case("X-Request-ID"), "XRequestId");
    }

    #[test]
    fn test_compose_keeps_parent_spelling() {
        let policy = NamingPolicy::new(true);
        let parent = policy.type_name("a_b1");
        assert_eq!(policy.compose(Some(&parent), "state"), format!("{}State", parent));
    }

    #[test]
    fn test_snake_case() {
        assert_eq!(to_snake_case("PetStatus"), "pet_status");
        assert_eq!(to_snake_case("HTTPServer"), "http_server");
        assert_eq!(to_snake_case("id"), "id");
        assert_eq!(to_snake_case("X-Request-ID"), "x_request_id");
    }

    #[test]
    fn test_case_conversion_is_idempotent() {
        for sample in SAMPLES {
            let pascal = to_pascal_case(sample);
            assert_eq!(to_pascal_case(&pascal), pascal, "pascal of {:?}", sample);

            let snake = to_snake_case(sample);
            assert_eq!(to_snake_case(&snake), snake, "snake of {:?}", sample);
        }
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("application/json"), "application_json");
        assert_eq!(sanitize("multipart/form-data"), "multipart_form_data");
        assert_eq!(sanitize("in progress!"), "in_progress");
        assert_eq!(sanitize("a.b+c"), "abc");
    }

    #[test]
    fn test_path_helpers() {
        assert_eq!(path_to_pascal("/item/{id}"), "ItemId");
        assert_eq!(path_to_pascal("/store/order/{order_id}"), "StoreOrderOrderId");
        assert_eq!(convert_path("/items/{id}"), "/items/:id");
        assert_eq!(convert_path("/a/{x}/b/{y_z}"), "/a/:x/b/:y_z");
        assert_eq!(convert_path("/plain"), "/plain");
    }

    #[test]
    fn test_policy_enabled() {
        let policy = NamingPolicy::new(true);
        assert_eq!(policy.type_name("order_item"), "OrderItem");
        assert_eq!(policy.field_name("orderItem"), "order_item");
        assert_eq!(policy.compose(Some("Order"), "state"), "OrderState");
        assert_eq!(policy.compose(None, "pet"), "Pet");
        assert_eq!(
            policy.compose(Some("GetPetRequest"), "application_json"),
            "GetPetRequestApplicationJson"
        );
    }

    #[test]
    fn test_policy_disabled_only_uppercases_first_letter() {
        let policy = NamingPolicy::new(false);
        assert_eq!(policy.type_name("order_item"), "Order_item");
        assert_eq!(policy.field_name("orderItem"), "OrderItem");
        assert_eq!(policy.field_name("x-rate-limit"), "X_rate_limit");
        assert_eq!(policy.compose(Some("Order"), "state"), "OrderState");
        assert_eq!(policy.compose(None, "pet status"), "Pet_status");
    }

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("Pet"));
        assert!(is_identifier("_private1"));
        assert!(!is_identifier("1abc"));
        assert!(!is_identifier("a-b"));
        assert!(!is_identifier(""));
    }
}
