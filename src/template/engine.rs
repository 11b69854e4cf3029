use log::{debug, info, warn};

use crate::model::{FieldValue, Record};

use super::{
    document::{Document, Element, CELL, PARAGRAPH, ROW, TABLE},
    placeholders, resolver,
};

/// Плейсхолдер для названия машины в строке-образце таблицы машин.
pub const MACHINE_NAME_FIELD: &str = "machine_name";

/// По этой подстроке таблица опознаётся как таблица машин.
const MACHINE_TABLE_MARKER: &str = "machine";

/// Итог заполнения шаблона.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FillReport {
    /// Сколько таблиц было развёрнуто по списку машин.
    pub expanded_tables: usize,

    /// Плейсхолдеры, для которых не нашлось значения.
    pub leftovers: Vec<String>,
}

/// Подставляет значения записи во все параграфы и таблицы документа.
///
/// Сначала обрабатываются параграфы документа, затем таблицы. Таблица машин
/// разворачивается: вторая строка служит образцом и повторяется для каждой
/// машины, остальные строки кроме заголовка удаляются.
pub fn fill(doc: &mut Document, record: &Record) -> FillReport {
    let mut report = FillReport::default();
    let body = doc.body_mut();

    for paragraph in body.children_mut(PARAGRAPH) {
        resolve_paragraph(paragraph, record, None);
    }

    for (index, table) in body.children_mut(TABLE).enumerate() {
        if is_machine_table(table) && !record.machine_names.is_empty() {
            if expand_machine_table(table, record) {
                debug!("Table {} expanded to {} machines", index, record.machine_names.len());
                report.expanded_tables += 1;
                continue;
            }
            warn!(
                "Machine table {} has no template row, placeholders are resolved in place",
                index
            );
        }

        for row in table.children_mut(ROW) {
            resolve_row(row, record, None);
        }
    }

    report.leftovers = leftovers(doc);

    for name in &report.leftovers {
        warn!("Placeholder {{{}}} has no value and is left as is", name);
    }

    info!(
        "Template filled: {} machine table(s) expanded, {} placeholder(s) left",
        report.expanded_tables,
        report.leftovers.len()
    );

    report
}

/// Таблица считается таблицей машин, если хоть в одной её ячейке
/// встречается слово `machine` в любом регистре.
pub fn is_machine_table(table: &Element) -> bool {
    table
        .children(ROW)
        .flat_map(|row| row.children(CELL))
        .flat_map(|cell| cell.children(PARAGRAPH))
        .any(|p| {
            p.paragraph_text()
                .to_lowercase()
                .contains(MACHINE_TABLE_MARKER)
        })
}

/// Разворачивает таблицу машин. Возвращает `false`, если в таблице нет
/// строки-образца и разворачивать нечего.
fn expand_machine_table(table: &mut Element, record: &Record) -> bool {
    let Some(template_row) = table.children(ROW).nth(1).cloned() else {
        return false;
    };

    table.truncate_children(ROW, 1);

    for machine in &record.machine_names {
        let mut row = template_row.clone();
        resolve_row(&mut row, record, Some(machine));
        table.push(row);
    }

    true
}

fn resolve_row(row: &mut Element, record: &Record, machine: Option<&str>) {
    for cell in row.children_mut(CELL) {
        for paragraph in cell.children_mut(PARAGRAPH) {
            resolve_paragraph(paragraph, record, machine);
        }
    }
}

/// Подставляет поля записи в параграф.
/// Параграф перезаписывается только если его текст изменился.
fn resolve_paragraph(paragraph: &mut Element, record: &Record, machine: Option<&str>) {
    let original = paragraph.paragraph_text();
    let resolved = resolve_text(&original, record, machine);

    if resolved != original {
        paragraph.set_paragraph_text(&resolved);
    }
}

/// Подставляет в текст название машины (если есть), а затем все поля записи.
pub fn resolve_text(text: &str, record: &Record, machine: Option<&str>) -> String {
    let mut text = match machine {
        Some(name) => resolver::resolve(text, MACHINE_NAME_FIELD, &FieldValue::Text(name)),
        None => text.to_owned(),
    };

    for (name, value) in record.fields() {
        text = resolver::resolve(&text, &name.to_string(), &value);
    }

    text
}

fn leftovers(doc: &Document) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();

    for paragraph in doc.body().descendants(PARAGRAPH) {
        for name in placeholders::find(&paragraph.paragraph_text()) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }

    names
}
