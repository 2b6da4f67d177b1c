//! DAB digital service list
//!
//! Layout of the `DAB_GET_DIGITAL_SERVICE_LIST` reply:
//!
//! ```text
//! offset  size  field
//!  0       4    status
//!  4       2    list size (LE)
//!  6       2    list version (LE)
//!  8       1    number of services
//!  9       3    alignment padding
//! 12      28    service record, repeated
//! ```
//!
//! Each record with a single component:
//!
//! ```text
//!  0       4    service id (LE)
//!  4       4    service info
//!  8      16    label
//! 24       2    component id (LE)
//! 26       2    component info
//! ```

use core::fmt;

use heapless::Vec;

use crate::config::{MAX_SERVICES, SERVICE_LABEL_LEN, SERVICE_RECORDS_OFFSET, SERVICE_RECORD_LEN};
use crate::error::MalformedResponse;

/// Reply length below which no list is available yet
const MIN_LIST_LEN: usize = 6;

/// Reply length needed to carry the header
const HEADER_END: usize = 9;

/// Service list header
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ServiceListHeader {
    /// List size in bytes as reported by the chip
    pub list_size: u16,
    /// List version, bumped on every change
    pub version: u16,
    /// Number of services that follow
    pub num_services: u8,
}

/// One service with its primary component
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ServiceRecord {
    /// Service identifier
    pub service_id: u32,
    /// Label bytes; the last byte is always the terminator
    label: [u8; SERVICE_LABEL_LEN + 1],
    /// Component identifier
    pub component_id: u16,
}

impl ServiceRecord {
    /// Create a record; labels longer than 16 bytes are cut
    #[must_use]
    pub fn new(service_id: u32, label: &[u8], component_id: u16) -> Self {
        let mut buf = [0u8; SERVICE_LABEL_LEN + 1];
        let len = label.len().min(SERVICE_LABEL_LEN);
        buf[..len].copy_from_slice(&label[..len]);
        Self {
            service_id,
            label: buf,
            component_id,
        }
    }

    /// Label bytes up to the first terminator
    #[must_use]
    pub fn label_bytes(&self) -> &[u8] {
        let end = self.label.iter().position(|&b| b == 0).unwrap_or(SERVICE_LABEL_LEN);
        &self.label[..end]
    }

    /// Label as text, cut at the first byte that is not valid UTF-8
    #[must_use]
    pub fn label(&self) -> &str {
        let bytes = self.label_bytes();
        match core::str::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => core::str::from_utf8(&bytes[..e.valid_up_to()]).unwrap_or_default(),
        }
    }

    fn decode(record: &[u8]) -> Self {
        let mut label = [0u8; SERVICE_LABEL_LEN + 1];
        label[..SERVICE_LABEL_LEN].copy_from_slice(&record[8..8 + SERVICE_LABEL_LEN]);
        label[SERVICE_LABEL_LEN] = 0;
        Self {
            service_id: u32::from_le_bytes([record[0], record[1], record[2], record[3]]),
            label,
            component_id: u16::from_le_bytes([record[24], record[25]]),
        }
    }
}

impl fmt::Debug for ServiceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceRecord")
            .field("service_id", &format_args!("{:#x}", self.service_id))
            .field("label", &self.label())
            .field("component_id", &self.component_id)
            .finish()
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for ServiceRecord {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "Service({=u32:#x}, {=str}, {=u16})",
            self.service_id,
            self.label(),
            self.component_id
        );
    }
}

/// Parsed service list, owned by the caller
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ServiceList {
    /// Header as reported by the chip
    pub header: ServiceListHeader,
    services: Vec<ServiceRecord, MAX_SERVICES>,
}

impl ServiceList {
    /// Number of services
    #[must_use]
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Check if the list holds no services
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Service at `index`
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ServiceRecord> {
        self.services.get(index)
    }

    /// Iterate over the services in chip order
    pub fn iter(&self) -> impl Iterator<Item = &ServiceRecord> {
        self.services.iter()
    }

    /// All services as a slice
    #[must_use]
    pub fn as_slice(&self) -> &[ServiceRecord] {
        &self.services
    }

    /// First service whose label, ignoring trailing spaces, equals `label`
    #[must_use]
    pub fn find_by_label(&self, label: &str) -> Option<&ServiceRecord> {
        self.services
            .iter()
            .find(|s| s.label().trim_end() == label.trim_end())
    }
}

impl<'a> IntoIterator for &'a ServiceList {
    type Item = &'a ServiceRecord;
    type IntoIter = core::slice::Iter<'a, ServiceRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.services.iter()
    }
}

impl fmt::Display for ServiceList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "List size:     {}", self.header.list_size)?;
        writeln!(f, "List version:  {}", self.header.version)?;
        writeln!(f, "Services:      {}", self.header.num_services)?;
        for (i, s) in self.services.iter().enumerate() {
            writeln!(
                f,
                "Num: {}  Service ID: {:x}  Service Name: {}  Component ID: {}",
                i,
                s.service_id,
                s.label(),
                s.component_id
            )?;
        }
        Ok(())
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for ServiceList {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "ServiceList(v{}, {} services)",
            self.header.version,
            self.services.len()
        );
    }
}

/// Parse a raw service list reply
///
/// Replies shorter than six bytes mean the list is not ready and give an
/// empty list. Records that would extend past `data`, or more records than
/// the list can hold, are rejected instead of read.
pub fn parse_service_list(data: &[u8]) -> Result<ServiceList, MalformedResponse> {
    let mut list = ServiceList::default();
    if data.len() < MIN_LIST_LEN {
        return Ok(list);
    }
    // Ready but too short for a header: nothing to report
    if data.len() < HEADER_END {
        return Ok(list);
    }

    list.header = ServiceListHeader {
        list_size: u16::from_le_bytes([data[4], data[5]]),
        version: u16::from_le_bytes([data[6], data[7]]),
        num_services: data[8],
    };

    let declared = list.header.num_services;
    let count = usize::from(declared);
    if count > MAX_SERVICES {
        return Err(MalformedResponse::TooManyServices {
            declared,
            capacity: MAX_SERVICES,
        });
    }

    if count == 0 {
        return Ok(list);
    }

    let required = SERVICE_RECORDS_OFFSET + count * SERVICE_RECORD_LEN;
    if data.len() < required {
        return Err(MalformedResponse::Truncated {
            declared,
            required,
            received: data.len(),
        });
    }

    for record in data[SERVICE_RECORDS_OFFSET..]
        .chunks_exact(SERVICE_RECORD_LEN)
        .take(count)
    {
        // Capacity checked above
        let _ = list.services.push(ServiceRecord::decode(record));
    }

    Ok(list)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_only_reply() {
        let data = [0x80, 0, 0, 0, 0x04, 0x00, 0x07, 0x00, 0x00];
        let list = parse_service_list(&data).unwrap();
        assert_eq!(list.header.version, 7);
        assert!(list.is_empty());
    }

    #[test]
    fn label_with_invalid_utf8_is_cut() {
        let record = ServiceRecord::new(1, b"Radio\xFF1", 0);
        assert_eq!(record.label(), "Radio");
        assert_eq!(record.label_bytes(), b"Radio\xFF1");
    }
}
