use crate::model::FieldValue;

/// Подставляет значение поля вместо всех его плейсхолдеров в тексте.
///
/// Распознаются `{name}` и `{{name}}`. Сопоставление буквальное, пробелы
/// внутри скобок не допускаются. Если после подстановки значение всё ещё
/// обёрнуто в лишнюю пару скобок (например `{{{name}}}`), эта пара тоже
/// снимается. Плейсхолдеры других полей остаются как есть.
pub fn resolve(text: &str, field: &str, value: &FieldValue) -> String {
    let placeholder = format!("{{{}}}", field);

    if !text.contains(&placeholder) {
        return text.to_owned();
    }

    let value = value.to_string();
    let value = value.trim_matches(|c| c == '{' || c == '}');

    let mut result = String::with_capacity(text.len() + value.len());
    let mut rest = text;

    while let Some(pos) = rest.find(&placeholder) {
        let (mut start, mut end) = (pos, pos + placeholder.len());

        // Двойные скобки, затем одна лишняя пара вокруг них.
        for _ in 0..2 {
            if rest[..start].ends_with('{') && rest[end..].starts_with('}') {
                start -= 1;
                end += 1;
            }
        }

        result.push_str(&rest[..start]);
        result.push_str(value);
        rest = &rest[end..];
    }

    result.push_str(rest);

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    macro_rules! resolve_tests {
        ($($name:ident: $value:expr,)*) => {
        $(
            #[test]
            fn $name() {
                let (expected, text, value) = $value;
                assert_eq!(expected, resolve(text, "client_name", &FieldValue::Text(value)));
            }
        )*
        }
    }

    resolve_tests! {
        single_braces: ("Client: Acme.", "Client: {client_name}.", "Acme"),
        double_braces: ("Client: Acme.", "Client: {{client_name}}.", "Acme"),
        redundant_braces: ("Client: Acme.", "Client: {{{client_name}}}.", "Acme"),
        every_occurrence: ("Acme and Acme", "{client_name} and {{client_name}}", "Acme"),
        adjacent_occurrences: ("AcmeAcme", "{client_name}{client_name}", "Acme"),
        no_placeholder: ("Client: Acme.", "Client: Acme.", "Bob"),
        other_field_untouched: ("{address} Acme", "{address} {client_name}", "Acme"),
        whitespace_not_supported: ("{ client_name }", "{ client_name }", "Acme"),
        prefix_name_not_matched: ("{client_name_full}", "{client_name_full}", "Acme"),
        value_braces_trimmed: ("Acme", "{client_name}", "{Acme}"),
        empty_value: ("Client: .", "Client: {client_name}.", ""),
        unicode_around: ("Клиент: Acme ✓", "Клиент: {client_name} ✓", "Acme"),
    }

    #[test]
    fn resolve_list_value() {
        let machines = vec!["M1".to_owned(), "M2".to_owned()];

        let text = resolve(
            "Machines: {{machine_names}}",
            "machine_names",
            &FieldValue::List(&machines),
        );

        assert_eq!(text, "Machines: M1, M2");
    }

    #[test]
    fn resolve_date_value() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 30).unwrap();

        let text = resolve("From {effective_date}", "effective_date", &FieldValue::Date(date));

        assert_eq!(text, "From 30 Mar, 2024");
    }

    #[test]
    fn resolve_number_value() {
        let text = resolve(
            "{subscription_duration_months} months",
            "subscription_duration_months",
            &FieldValue::Number(12),
        );

        assert_eq!(text, "12 months");
    }

    #[test]
    fn value_containing_placeholder_is_not_expanded_again() {
        let text = resolve("{client_name}", "client_name", &FieldValue::Text("x {client_name} y"));

        assert_eq!(text, "x {client_name} y");
    }
}
