use mailparse::MailParseError;

/// The `Key: Value` header fields of a `METADATA` or `PKG-INFO` file, in file order.
///
/// Keys are matched case-insensitively and may repeat, as `Requires-Dist` does.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    fields: Vec<(String, String)>,
}

impl Headers {
    /// Parse the headers of an RFC 822 style metadata file, ignoring the body.
    pub fn parse(content: &[u8]) -> Result<Self, MailParseError> {
        let (headers, _body_start) = mailparse::parse_headers(content)?;
        Ok(Self {
            fields: headers
                .iter()
                .map(|header| (header.get_key(), header.get_value()))
                .collect(),
        })
    }

    /// The first value of the field `name`.
    pub fn get_first_value(&self, name: &str) -> Option<&str> {
        self.get_all_values(name).next()
    }

    /// Every value of the field `name`. The iterator borrows the headers only, not `name`.
    pub fn get_all_values<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> + use<'a> {
        let name = name.to_owned();
        self.fields
            .iter()
            .filter(move |(key, _)| key.eq_ignore_ascii_case(&name))
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(String, String)> for Headers {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::Headers;

    #[test]
    fn repeated_fields() {
        let headers = Headers::parse(
            indoc! {"
                Metadata-Version: 2.1
                Name: foo
                Version: 1.0
                Requires-Dist: bar>=1
                requires-dist: baz; extra == 'test'

                Long description with: colons
            "}
            .as_bytes(),
        )
        .unwrap();
        assert_eq!(headers.get_first_value("name"), Some("foo"));
        assert_eq!(
            headers.get_all_values("Requires-Dist").collect::<Vec<_>>(),
            ["bar>=1", "baz; extra == 'test'"]
        );
        assert_eq!(headers.get_first_value("Summary"), None);
        assert_eq!(headers.iter().count(), 5);
    }

    #[test]
    fn lookups_outlive_the_field_name() {
        let headers = Headers::parse(b"Name: foo\nRequires-Dist: bar\nRequires-Dist: baz\n").unwrap();
        let values = {
            let field = String::from("requires-dist");
            headers.get_all_values(&field)
        };
        assert_eq!(values.collect::<Vec<_>>(), ["bar", "baz"]);

        let name = headers.get_first_value(&"NAME".to_lowercase());
        assert_eq!(name, Some("foo"));
    }
}
