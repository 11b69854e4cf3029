use inquire::validator::Validation;
use inquire::{CustomType, DateSelect, Text};

use crate::model::{Record, SubscriptionMonths};

const MACHINE_NAMES_SEPARATOR: char = ';';

/// Показывает извлечённые данные и даёт пользователю их поправить.
/// Возвращает новую запись, исходная не меняется.
pub fn review(record: &Record) -> anyhow::Result<Record> {
    println!("Проверьте данные договора. Enter оставляет текущее значение.");

    let client_name = prompt_text("Название клиента", &record.client_name)?;
    let address = prompt_text("Адрес клиента", &record.address)?;
    let purchase_order = prompt_text("Номер заказа (PO)", &record.purchase_order)?;

    let machine_names = prompt_text(
        "Машины (через ;)",
        &record.machine_names.join(&format!("{} ", MACHINE_NAMES_SEPARATOR)),
    )?;

    let effective_date = DateSelect::new("Дата вступления в силу")
        .with_default(record.effective_date)
        .prompt()?;

    let months = CustomType::<u32>::new("Срок подписки в месяцах")
        .with_default(record.subscription_duration_months.get())
        .with_error_message("Введите целое число")
        .with_validator(|m: &u32| {
            if *m == 0 {
                return Ok(Validation::Invalid("должно быть не меньше 1".into()));
            };
            Ok(Validation::Valid)
        })
        .prompt()?;

    Ok(Record {
        client_name,
        effective_date,
        machine_names: split_machine_names(&machine_names),
        subscription_duration_months: SubscriptionMonths::new(months)?,
        purchase_order,
        address,
    })
}

fn prompt_text(title: &str, current: &str) -> anyhow::Result<String> {
    let mut prompt = Text::new(title);

    if !current.is_empty() {
        prompt = prompt.with_default(current);
    }

    let val = prompt.prompt()?;

    Ok(val.trim().to_owned())
}

/// Разбивает строку с машинами по `;`, пустые элементы отбрасываются.
pub fn split_machine_names(input: &str) -> Vec<String> {
    input
        .split(MACHINE_NAMES_SEPARATOR)
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_owned)
        .collect()
}
