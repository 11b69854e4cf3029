/// Находит в тексте все плейсхолдеры вида `{name}` и `{{name}}`.
/// Возвращает имена в порядке появления.
pub fn find(text: &str) -> Vec<String> {
    scanner::placeholders(text).unwrap_or_default()
}

peg::parser! {
    grammar scanner() for str {
        pub rule placeholders() -> Vec<String>
            = t:(placeholder() / skip())* {
                t.into_iter().flatten().collect()
            }

        rule placeholder() -> Option<String>
            = "{" "{"? n:$(ident()) "}" "}"? {
                Some(n.to_owned())
            }

        rule skip() -> Option<String>
            = [_] { None }

        rule ident()
            = ['a'..='z' | 'A'..='Z' | '_'] ['a'..='z' | 'A'..='Z' | '0'..='9' | '_']*
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! find_tests {
        ($($name:ident: $value:expr,)*) => {
        $(
            #[test]
            fn $name() {
                let (expected, input): (Vec<&str>, &str) = $value;
                assert_eq!(expected, find(input));
            }
        )*
        }
    }

    find_tests! {
        find_nothing: (vec![], "plain text"),
        find_single: (vec!["client_name"], "Client: {client_name}."),
        find_double: (vec!["address"], "At {{address}}"),
        find_several: (vec!["a", "b2"], "{a} and {{b2}}"),
        find_skips_spaces: (vec![], "{ client_name }"),
        find_skips_json: (vec![], r#"{"key": 1}"#),
        find_after_stray_brace: (vec!["x"], "{ {x}"),
        find_unicode_text: (vec!["po"], "Заказ № {po}"),
    }
}
