//! Per-file notify records (offline "edit" notifications), stored as
//! siblings keyed by file name within their parent folder.

/// One `CVS/Notify` record: the editing action and when it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyInfo {
    pub name: String,
    pub notify_type: char,
    pub timestamp: String,
    pub last_modified: String,
    pub unixmode: String,
    pub host: String,
    pub watches: String,
}

impl NotifyInfo {
    /// Parse one `CVS/Notify` line: `name/type/timestamp+lastmod/unixmode/host/watches`.
    pub fn parse(line: &str) -> Option<Self> {
        let rest = line.strip_prefix('/')?;
        let mut fields = rest.splitn(6, '/');
        let name = fields.next()?.to_string();
        let type_field = fields.next()?;
        let notify_type = type_field.chars().next().unwrap_or('E');
        let ts_field = fields.next()?.to_string();
        let unixmode = fields.next().unwrap_or("").to_string();
        let host = fields.next().unwrap_or("").to_string();
        let watches = fields.next().unwrap_or("").to_string();
        let (timestamp, last_modified) = ts_field
            .split_once('+')
            .map(|(a, b)| (a.to_string(), b.to_string()))
            .unwrap_or((ts_field, String::new()));
        Some(NotifyInfo {
            name,
            notify_type,
            timestamp,
            last_modified,
            unixmode,
            host,
            watches,
        })
    }

    pub fn render(&self) -> String {
        format!(
            "/{}/{}/{}+{}/{}/{}/{}",
            self.name,
            self.notify_type,
            self.timestamp,
            self.last_modified,
            self.unixmode,
            self.host,
            self.watches
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_well_formed_line() {
        let line = "/f.txt/E/Thu Jan  1 00:00:00 1970+/rw-r--r--/myhost/";
        let info = NotifyInfo::parse(line).unwrap();
        assert_eq!(info.name, "f.txt");
        assert_eq!(info.notify_type, 'E');
        assert_eq!(info.render(), line);
    }

    #[test]
    fn preserves_a_trailing_watches_field() {
        let line = "/f.txt/E/Thu Jan  1 00:00:00 1970+/rw-r--r--/myhost/edit,unedit";
        let info = NotifyInfo::parse(line).unwrap();
        assert_eq!(info.host, "myhost");
        assert_eq!(info.watches, "edit,unedit");
        assert_eq!(info.render(), line);
    }
}
