use std::fmt::Display;

use anyhow::anyhow;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::newtype;

/// Адрес клиента, если он не был найден в документах.
pub const DEFAULT_ADDRESS: &str = "Unit IV, Darjeeling Road, Kolkata, West Bengal";

/// Формат, в котором даты подставляются в шаблон: `30 Mar, 2024`.
pub const DATE_FORMAT: &str = "%d %b, %Y";

/// Формат дат во входных данных.
pub const INPUT_DATE_FORMAT: &str = "%Y-%m-%d";

const DEFAULT_SUBSCRIPTION_MONTHS: u32 = 12;

/// Данные договора.
/// Собираются заново при каждом запуске и дальше не меняются.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Название клиента.
    #[serde(default)]
    pub client_name: String,

    /// Дата вступления договора в силу.
    pub effective_date: NaiveDate,

    /// Названия машин. Порядок определяет порядок строк в таблице машин.
    #[serde(default)]
    pub machine_names: Vec<String>,

    /// Срок подписки в месяцах.
    #[serde(default)]
    pub subscription_duration_months: SubscriptionMonths,

    /// Номер заказа на покупку.
    #[serde(default)]
    pub purchase_order: String,

    /// Адрес клиента.
    #[serde(default = "default_address")]
    pub address: String,
}

fn default_address() -> String {
    DEFAULT_ADDRESS.to_owned()
}

impl Record {
    /// Создаёт запись с указанной датой и значениями по-умолчанию в остальных полях.
    pub fn new(effective_date: NaiveDate) -> Self {
        Self {
            client_name: String::new(),
            effective_date,
            machine_names: Vec::new(),
            subscription_duration_months: SubscriptionMonths::default(),
            purchase_order: String::new(),
            address: default_address(),
        }
    }

    /// Запись, которая используется когда извлечь данные из документов не удалось.
    pub fn fallback(today: NaiveDate) -> Self {
        Self::new(today)
    }

    /// Возвращает значение поля для подстановки в шаблон.
    pub fn value(&self, name: FieldName) -> FieldValue<'_> {
        match name {
            FieldName::ClientName => FieldValue::Text(&self.client_name),
            FieldName::EffectiveDate => FieldValue::Date(self.effective_date),
            FieldName::MachineNames => FieldValue::List(&self.machine_names),
            FieldName::SubscriptionDurationMonths => {
                FieldValue::Number(self.subscription_duration_months.get())
            }
            FieldName::PurchaseOrder => FieldValue::Text(&self.purchase_order),
            FieldName::Address => FieldValue::Text(&self.address),
        }
    }

    /// Все поля записи в каноническом порядке.
    pub fn fields(&self) -> impl Iterator<Item = (FieldName, FieldValue<'_>)> + '_ {
        enum_iterator::all::<FieldName>().map(move |name| (name, self.value(name)))
    }

    /// Имя файла готового договора.
    pub fn output_file_name(&self) -> String {
        format!(
            "generated_contract_{}.docx",
            sanitize_file_component(&self.purchase_order)
        )
    }
}

/// Заменяет разделители путей, чтобы значение можно было использовать в имени файла.
pub fn sanitize_file_component(value: &str) -> String {
    value.replace(['/', '\\'], "_")
}

newtype!(SubscriptionMonths, u32, "u32", subscription_months_validate);

fn subscription_months_validate(value: &u32) -> anyhow::Result<()> {
    if *value == 0 {
        return Err(anyhow!("should be at least 1 month"));
    }

    Ok(())
}

impl Default for SubscriptionMonths {
    fn default() -> Self {
        Self(DEFAULT_SUBSCRIPTION_MONTHS)
    }
}

/// Все поля договора, доступные в шаблоне.
/// Порядок вариантов задаёт порядок подстановки.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    std::hash::Hash,
    derive_more::Display,
    enum_iterator::Sequence,
)]
pub enum FieldName {
    #[display(fmt = "client_name")]
    ClientName,
    #[display(fmt = "effective_date")]
    EffectiveDate,
    #[display(fmt = "machine_names")]
    MachineNames,
    #[display(fmt = "subscription_duration_months")]
    SubscriptionDurationMonths,
    #[display(fmt = "purchase_order")]
    PurchaseOrder,
    #[display(fmt = "address")]
    Address,
}

/// Значение поля перед подстановкой.
/// `Display` приводит его к тому виду, в котором оно попадёт в документ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    List(&'a [String]),
    Date(NaiveDate),
    Number(u32),
}

impl Display for FieldValue<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{}", s),
            Self::List(items) => write!(f, "{}", items.join(", ")),
            Self::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            Self::Number(n) => write!(f, "{}", n),
        }
    }
}

/// Данные договора в том виде, в котором их вернула языковая модель.
/// Любое поле может отсутствовать.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
pub struct RecordCandidate {
    pub client_name: Option<String>,
    pub address: Option<String>,
    pub machine_names: Option<Vec<String>>,
    pub purchase_order: Option<String>,
    pub effective_date: Option<String>,
    pub subscription_duration_months: Option<i64>,
}

impl RecordCandidate {
    /// Проверяет кандидата и превращает его в запись договора.
    /// Дата обязательна, остальные поля получают значения по-умолчанию.
    pub fn into_record(self) -> anyhow::Result<Record> {
        let raw_date = self
            .effective_date
            .ok_or(anyhow!("effective_date is missing"))?;
        let effective_date = NaiveDate::parse_from_str(raw_date.trim(), INPUT_DATE_FORMAT)
            .map_err(|e| anyhow!("effective_date {:?}: {}", raw_date, e))?;

        let subscription_duration_months = match self.subscription_duration_months {
            Some(months) => u32::try_from(months)
                .map_err(|_| anyhow!("subscription_duration_months {} is out of range", months))
                .and_then(SubscriptionMonths::new)?,
            None => SubscriptionMonths::default(),
        };

        let machine_names = self
            .machine_names
            .unwrap_or_default()
            .into_iter()
            .map(|m| m.trim().to_owned())
            .filter(|m| !m.is_empty())
            .collect();

        Ok(Record {
            client_name: self.client_name.unwrap_or_default(),
            effective_date,
            machine_names,
            subscription_duration_months,
            purchase_order: self.purchase_order.unwrap_or_default(),
            address: self
                .address
                .filter(|a| !a.trim().is_empty())
                .unwrap_or_else(default_address),
        })
    }
}
