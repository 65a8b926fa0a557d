//! Table header parsing.
//!
//! Every `.dbf` file starts with a 68-byte table header ([`TableHeader`])
//! holding the version byte, the date of last update, the record count, the
//! header and record lengths, a few dBASE IV era flags, and the language
//! driver. Reserved areas are kept verbatim so a header can be written back
//! byte-for-byte.

use std::fmt;

use byteorder::{ByteOrder, LittleEndian};
use serde::Serialize;

use crate::dbase::constants::*;
use crate::dbase::cursor::ByteCursor;
use crate::DbfError;

/// Date of last update as stored in the header (year is already offset from 1900).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LastUpdate {
    pub year: u16,
    pub month: u8,
    pub day: u8,
}

impl LastUpdate {
    /// Returns true if month and day are in calendar range.
    pub fn is_plausible(&self) -> bool {
        (1..=12).contains(&self.month) && (1..=31).contains(&self.day)
    }
}

impl fmt::Display for LastUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// Parsed table header (68 bytes at offset 0).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableHeader {
    /// Version byte. Bits 0-2 hold the level (4 = dBASE Level 7).
    pub version: u8,
    /// Raw last-update year byte (years since 1900).
    pub update_year: u8,
    /// Last-update month.
    pub update_month: u8,
    /// Last-update day.
    pub update_day: u8,
    /// Number of records, live and deleted.
    pub record_count: u32,
    /// Bytes from the start of the file to the first record.
    pub header_length: u16,
    /// Bytes per record, including the deletion flag.
    pub record_length: u16,
    /// Bytes 12-13, reserved.
    pub reserved_1: [u8; 2],
    /// Incomplete dBASE IV transaction flag.
    pub incomplete_transaction: u8,
    /// dBASE IV encryption flag.
    pub encryption: u8,
    /// Free record thread (multi-user processing).
    pub free_record_thread: u32,
    /// Bytes 20-23, reserved for multi-user processing.
    pub reserved_2: u32,
    /// Bytes 24-27, reserved for multi-user processing.
    pub reserved_3: u32,
    /// 0x01 if a production `.MDX` file exists.
    pub mdx_flag: u8,
    /// Language driver id.
    pub language_driver: u8,
    /// Bytes 30-31, reserved.
    pub reserved_4: [u8; 2],
    /// Language driver name, raw 32 bytes.
    #[serde(skip)]
    pub language_name: [u8; SIZE_LANGUAGE_NAME],
    /// Bytes 64-67, reserved.
    pub reserved_5: [u8; 4],
}

impl TableHeader {
    /// Parse a header from a byte slice of at least 68 bytes.
    ///
    /// # Examples
    ///
    /// ```
    /// use dbf::dbase::header::TableHeader;
    ///
    /// let mut data = vec![0u8; 68];
    /// data[0] = 0x04;               // dBASE Level 7
    /// data[4] = 3;                  // 3 records
    /// data[8] = 116;                // header length
    /// data[10] = 11;                // record length
    /// let hdr = TableHeader::parse(&data).unwrap();
    /// assert_eq!(hdr.level(), 4);
    /// assert_eq!(hdr.record_count, 3);
    /// assert_eq!(hdr.header_length, 116);
    /// assert_eq!(hdr.record_length, 11);
    /// ```
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < SIZE_TABLE_HEADER {
            return None;
        }

        let mut language_name = [0u8; SIZE_LANGUAGE_NAME];
        language_name
            .copy_from_slice(&data[HDR_LANGUAGE_NAME..HDR_LANGUAGE_NAME + SIZE_LANGUAGE_NAME]);

        Some(TableHeader {
            version: data[HDR_VERSION],
            update_year: data[HDR_LAST_UPDATE],
            update_month: data[HDR_LAST_UPDATE + 1],
            update_day: data[HDR_LAST_UPDATE + 2],
            record_count: LittleEndian::read_u32(&data[HDR_RECORD_COUNT..]),
            header_length: LittleEndian::read_u16(&data[HDR_HEADER_LENGTH..]),
            record_length: LittleEndian::read_u16(&data[HDR_RECORD_LENGTH..]),
            reserved_1: [data[HDR_RESERVED_1], data[HDR_RESERVED_1 + 1]],
            incomplete_transaction: data[HDR_INCOMPLETE_TXN],
            encryption: data[HDR_ENCRYPTION],
            free_record_thread: LittleEndian::read_u32(&data[HDR_FREE_RECORD_THREAD..]),
            reserved_2: LittleEndian::read_u32(&data[HDR_RESERVED_2..]),
            reserved_3: LittleEndian::read_u32(&data[HDR_RESERVED_3..]),
            mdx_flag: data[HDR_MDX_FLAG],
            language_driver: data[HDR_LANGUAGE_DRIVER],
            reserved_4: [data[HDR_RESERVED_4], data[HDR_RESERVED_4 + 1]],
            language_name,
            reserved_5: [
                data[HDR_RESERVED_5],
                data[HDR_RESERVED_5 + 1],
                data[HDR_RESERVED_5 + 2],
                data[HDR_RESERVED_5 + 3],
            ],
        })
    }

    /// Read the header from a cursor positioned at offset 0.
    pub fn read(cursor: &mut ByteCursor) -> Result<Self, DbfError> {
        if cursor.remaining() < SIZE_TABLE_HEADER as u64 {
            return Err(DbfError::TruncatedHeader {
                needed: SIZE_TABLE_HEADER,
                available: cursor.remaining(),
            });
        }
        let buf = cursor.read_bytes(SIZE_TABLE_HEADER)?;
        let hdr = Self::parse(&buf).ok_or(DbfError::TruncatedHeader {
            needed: SIZE_TABLE_HEADER,
            available: buf.len() as u64,
        })?;
        log::debug!(
            "Header: level {}, {} records, header {} bytes, record {} bytes",
            hdr.level(),
            hdr.record_count,
            hdr.header_length,
            hdr.record_length
        );
        Ok(hdr)
    }

    /// Serialize back to the 68-byte on-disk layout.
    pub fn to_bytes(&self) -> [u8; SIZE_TABLE_HEADER] {
        let mut buf = [0u8; SIZE_TABLE_HEADER];
        buf[HDR_VERSION] = self.version;
        buf[HDR_LAST_UPDATE] = self.update_year;
        buf[HDR_LAST_UPDATE + 1] = self.update_month;
        buf[HDR_LAST_UPDATE + 2] = self.update_day;
        LittleEndian::write_u32(&mut buf[HDR_RECORD_COUNT..], self.record_count);
        LittleEndian::write_u16(&mut buf[HDR_HEADER_LENGTH..], self.header_length);
        LittleEndian::write_u16(&mut buf[HDR_RECORD_LENGTH..], self.record_length);
        buf[HDR_RESERVED_1..HDR_RESERVED_1 + 2].copy_from_slice(&self.reserved_1);
        buf[HDR_INCOMPLETE_TXN] = self.incomplete_transaction;
        buf[HDR_ENCRYPTION] = self.encryption;
        LittleEndian::write_u32(&mut buf[HDR_FREE_RECORD_THREAD..], self.free_record_thread);
        LittleEndian::write_u32(&mut buf[HDR_RESERVED_2..], self.reserved_2);
        LittleEndian::write_u32(&mut buf[HDR_RESERVED_3..], self.reserved_3);
        buf[HDR_MDX_FLAG] = self.mdx_flag;
        buf[HDR_LANGUAGE_DRIVER] = self.language_driver;
        buf[HDR_RESERVED_4..HDR_RESERVED_4 + 2].copy_from_slice(&self.reserved_4);
        buf[HDR_LANGUAGE_NAME..HDR_LANGUAGE_NAME + SIZE_LANGUAGE_NAME]
            .copy_from_slice(&self.language_name);
        buf[HDR_RESERVED_5..HDR_RESERVED_5 + 4].copy_from_slice(&self.reserved_5);
        buf
    }

    /// Format level from version bits 0-2 (3 = Level 5, 4 = Level 7).
    pub fn level(&self) -> u8 {
        self.version & VERSION_LEVEL_MASK
    }

    /// Returns true if the version byte announces a `.DBT` memo file.
    pub fn has_memo(&self) -> bool {
        self.version & VERSION_MEMO_BITS != 0
    }

    /// Returns true if a production `.MDX` index exists for the table.
    pub fn has_mdx(&self) -> bool {
        self.mdx_flag != 0
    }

    /// Returns true if the table is flagged as encrypted.
    pub fn is_encrypted(&self) -> bool {
        self.encryption != 0
    }

    /// Returns true if a dBASE IV transaction was left incomplete.
    pub fn has_incomplete_transaction(&self) -> bool {
        self.incomplete_transaction != 0
    }

    /// Date of last update, if month and day are plausible.
    pub fn last_update(&self) -> Option<LastUpdate> {
        let date = LastUpdate {
            year: LAST_UPDATE_BASE_YEAR + self.update_year as u16,
            month: self.update_month,
            day: self.update_day,
        };
        date.is_plausible().then_some(date)
    }

    /// Language driver name with NUL padding and trailing blanks removed.
    pub fn language_name(&self) -> String {
        let end = self
            .language_name
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(SIZE_LANGUAGE_NAME);
        String::from_utf8_lossy(&self.language_name[..end])
            .trim_end()
            .to_string()
    }

    /// Offset one past the last record: `header_length + record_count * record_length`.
    pub fn data_end(&self) -> u64 {
        self.header_length as u64 + self.record_count as u64 * self.record_length as u64
    }

    /// Check the length invariants against the actual file size.
    pub fn validate(&self, file_size: u64) -> Result<(), DbfError> {
        if self.header_length == 0 {
            return Err(DbfError::InconsistentHeader(
                "header length is zero".to_string(),
            ));
        }
        if self.record_length == 0 {
            return Err(DbfError::InconsistentHeader(
                "record length is zero".to_string(),
            ));
        }
        if (self.header_length as usize) < SIZE_TABLE_HEADER {
            return Err(DbfError::InconsistentHeader(format!(
                "header length {} is smaller than the {}-byte table header",
                self.header_length, SIZE_TABLE_HEADER
            )));
        }
        if self.data_end() > file_size {
            return Err(DbfError::InconsistentHeader(format!(
                "{} records of {} bytes after a {}-byte header need {} bytes, file has {}",
                self.record_count,
                self.record_length,
                self.header_length,
                self.data_end(),
                file_size
            )));
        }
        Ok(())
    }
}
