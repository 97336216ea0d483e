//! Human readable three-layer listing of a packet.

use std::fmt;

use e131_core::Packet;

/// Renders every header field, one `name : value` line each.
pub struct Dump<'a>(pub &'a Packet);

impl fmt::Display for Dump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Packet { root, frame, dmp } = self.0;

        writeln!(f, "[Root Layer]")?;
        field(f, "preamble_size", root.preamble_size)?;
        field(f, "postamble_size", root.postamble_size)?;
        field(f, "acn_id", printable(&root.acn_id))?;
        field(f, "flength", root.flength)?;
        field(f, "vector", root.vector)?;
        field(f, "cid", hex(&root.cid, ""))?;

        writeln!(f, "[Frame Layer]")?;
        field(f, "flength", frame.flength)?;
        field(f, "vector", frame.vector)?;
        field(f, "source_name", &frame.source_name)?;
        field(f, "priority", frame.priority)?;
        field(f, "reserved", frame.reserved)?;
        field(f, "sequence_number", frame.sequence_number)?;
        field(f, "options", frame.options.bits())?;
        field(f, "universe", frame.universe)?;

        writeln!(f, "[DMP Layer]")?;
        field(f, "flength", dmp.flength)?;
        field(f, "vector", dmp.vector)?;
        field(f, "type", dmp.address_type)?;
        field(f, "first_address", dmp.first_address)?;
        field(f, "address_increment", dmp.address_increment)?;
        field(f, "property_value_count", dmp.property_values.count())?;
        write!(f, "  {:<20} :", "property_values")?;
        for value in dmp.property_values.as_bytes() {
            write!(f, " {:02x}", value)?;
        }
        writeln!(f)
    }
}

fn field(f: &mut fmt::Formatter<'_>, name: &str, value: impl fmt::Display) -> fmt::Result {
    writeln!(f, "  {:<20} : {}", name, value)
}

fn printable(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

pub fn hex(bytes: &[u8], sep: &str) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(sep)
}

#[cfg(test)]
mod tests {
    use super::{Dump, hex};
    use e131_core::{PacketBuilder, PacketOption};

    #[test]
    fn lists_all_three_layers() {
        let mut packet = PacketBuilder::new(1, 2)
            .source_name("E1.31 Test Client")
            .option(PacketOption::Preview, true)
            .cid([0xab; 16])
            .build()
            .unwrap();
        packet.channels_mut().copy_from_slice(&[0x10, 0xff]);

        let text = Dump(&packet).to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "[Root Layer]");
        assert_eq!(lines[1], "  preamble_size        : 16");
        assert_eq!(lines[3], "  acn_id               : ASC-E1.17");
        assert_eq!(lines[6], format!("  cid                  : {}", "ab".repeat(16)));
        assert!(text.contains("  source_name          : E1.31 Test Client\n"));
        assert!(text.contains("  options              : 128\n"));
        assert!(text.contains("  property_value_count : 3\n"));
        assert_eq!(
            lines.last().copied(),
            Some("  property_values      : 00 10 ff")
        );
    }

    #[test]
    fn hex_joins_with_separator() {
        assert_eq!(hex(&[0x00, 0x7f, 0xff], ""), "007fff");
        assert_eq!(hex(&[0x01, 0x02], " "), "01 02");
    }
}
