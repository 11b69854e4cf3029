/// Создаёт новый доменный тип поверх примитива с проверкой значения.
///
/// Тип сериализуется как исходный примитив, а при десериализации и создании
/// через `new` прогоняется через функцию валидации.
#[macro_export]
macro_rules! newtype {
    ($tname:ident, $type:ty, $try_from:literal, $validate_fn:ident) => {
        #[derive(
            std::fmt::Debug,
            std::clone::Clone,
            std::marker::Copy,
            serde::Serialize,
            serde::Deserialize,
            std::cmp::PartialEq,
            std::cmp::Eq,
        )]
        #[serde(try_from = $try_from, into = $try_from)]
        pub struct $tname($type);

        impl $tname {
            pub fn new(value: $type) -> anyhow::Result<Self> {
                Self::validate(&value)?;
                Ok(Self(value))
            }

            pub fn get(&self) -> $type {
                self.0
            }

            fn validate(value: &$type) -> anyhow::Result<()> {
                $validate_fn(value)
            }
        }

        impl std::convert::From<$tname> for $type {
            fn from(value: $tname) -> Self {
                value.0
            }
        }

        impl std::convert::TryFrom<$type> for $tname {
            type Error = anyhow::Error;

            fn try_from(value: $type) -> std::result::Result<Self, Self::Error> {
                $tname::new(value)
            }
        }

        impl std::fmt::Display for $tname {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $tname {
            type Err = anyhow::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $tname::new(<$type as std::str::FromStr>::from_str(s.trim())?)
            }
        }
    };
}
