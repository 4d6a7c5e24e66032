use crate::{Components, Error, Field, Result, SnowflakeId};

/// The identity a generator stamps into every ID it produces.
///
/// For flat layouts only `server` is encoded and `datacenter` must be zero.
/// For split layouts both parts are encoded, datacenter above server.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct NodeId {
    pub datacenter: u64,
    pub server: u64,
}

impl NodeId {
    /// A node for a flat layout.
    pub const fn flat(server: u64) -> Self {
        Self {
            datacenter: 0,
            server,
        }
    }

    /// A node for a split datacenter/server layout.
    pub const fn split(datacenter: u64, server: u64) -> Self {
        Self { datacenter, server }
    }

    /// Returns the node `offset` server slots above this one, within the same
    /// datacenter.
    ///
    /// Overflow saturates so the result fails layout validation instead of
    /// wrapping onto a lower identifier.
    pub const fn offset(self, offset: u64) -> Self {
        Self {
            datacenter: self.datacenter,
            server: self.server.saturating_add(offset),
        }
    }
}

/// Bit partition of a 64-bit Snowflake ID.
///
/// From most to least significant bit:
///
/// ```text
///  +--------------+-----------+----------------+------------+----------+
///  | reserved (1) | timestamp | datacenter (d) | server (s) | sequence |
///  +--------------+-----------+----------------+------------+----------+
/// ```
///
/// The timestamp takes every bit the other fields leave over, so the fields
/// always sum to 63 bits and the packed value is a non-negative `i64`. A flat
/// layout simply has zero datacenter bits.
///
/// # Example
///
/// ```
/// use flurry::{Layout, NodeId};
///
/// let layout = Layout::DATACENTER;
/// let id = layout.encode(1000, NodeId::split(3, 7), 42);
/// let parts = layout.decode(id);
/// assert_eq!(parts.timestamp, 1000);
/// assert_eq!(parts.datacenter, 3);
/// assert_eq!(parts.server, 7);
/// assert_eq!(parts.sequence, 42);
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct Layout {
    datacenter_bits: u8,
    server_bits: u8,
    sequence_bits: u8,
}

impl Default for Layout {
    fn default() -> Self {
        Self::TWITTER
    }
}

const fn mask(bits: u8) -> u64 {
    (1_u64 << bits) - 1
}

impl Layout {
    /// 41 bits timestamp, 10 bits machine ID, 12 bits sequence.
    pub const TWITTER: Self = Self {
        datacenter_bits: 0,
        server_bits: 10,
        sequence_bits: 12,
    };

    /// 41 bits timestamp, 5 bits datacenter, 5 bits server, 12 bits sequence.
    pub const DATACENTER: Self = Self {
        datacenter_bits: 5,
        server_bits: 5,
        sequence_bits: 12,
    };

    /// Creates a layout, leaving the remaining high bits to the timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLayout`] if there are no sequence bits or the
    /// other fields leave fewer than one bit for the timestamp.
    pub const fn new(datacenter_bits: u8, server_bits: u8, sequence_bits: u8) -> Result<Self> {
        let used = datacenter_bits as u16 + server_bits as u16 + sequence_bits as u16;
        if sequence_bits == 0 || used > 62 {
            return Err(Error::InvalidLayout {
                datacenter_bits,
                server_bits,
                sequence_bits,
            });
        }
        Ok(Self {
            datacenter_bits,
            server_bits,
            sequence_bits,
        })
    }

    /// A layout with a single machine field of `machine_bits`.
    ///
    /// # Errors
    ///
    /// See [`Layout::new`].
    pub const fn flat(machine_bits: u8, sequence_bits: u8) -> Result<Self> {
        Self::new(0, machine_bits, sequence_bits)
    }

    /// Returns `true` when the machine field is not split.
    pub const fn is_flat(&self) -> bool {
        self.datacenter_bits == 0
    }

    pub const fn datacenter_bits(&self) -> u8 {
        self.datacenter_bits
    }

    pub const fn server_bits(&self) -> u8 {
        self.server_bits
    }

    /// Total width of the machine identifier (datacenter plus server).
    pub const fn machine_bits(&self) -> u8 {
        self.datacenter_bits + self.server_bits
    }

    pub const fn sequence_bits(&self) -> u8 {
        self.sequence_bits
    }

    pub const fn timestamp_bits(&self) -> u8 {
        63 - self.machine_bits() - self.sequence_bits
    }

    pub const fn server_shift(&self) -> u8 {
        self.sequence_bits
    }

    pub const fn datacenter_shift(&self) -> u8 {
        self.sequence_bits + self.server_bits
    }

    pub const fn timestamp_shift(&self) -> u8 {
        self.sequence_bits + self.machine_bits()
    }

    pub const fn max_timestamp(&self) -> u64 {
        mask(self.timestamp_bits())
    }

    pub const fn max_datacenter(&self) -> u64 {
        mask(self.datacenter_bits)
    }

    pub const fn max_server(&self) -> u64 {
        mask(self.server_bits)
    }

    pub const fn max_sequence(&self) -> u64 {
        mask(self.sequence_bits)
    }

    /// Checks that both parts of `node` fit their fields.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIdentifier`] naming the first field that
    /// overflows.
    pub const fn validate_node(&self, node: NodeId) -> Result<()> {
        if node.datacenter > self.max_datacenter() {
            return Err(Error::InvalidIdentifier {
                field: Field::Datacenter,
                value: node.datacenter,
                max: self.max_datacenter(),
            });
        }
        if node.server > self.max_server() {
            return Err(Error::InvalidIdentifier {
                field: Field::Server,
                value: node.server,
                max: self.max_server(),
            });
        }
        Ok(())
    }

    /// Packs the fields into an ID.
    ///
    /// Inputs are expected to fit their fields already; out-of-range bits are
    /// masked off rather than allowed to bleed into neighbouring fields.
    pub const fn encode(&self, timestamp: u64, node: NodeId, sequence: u64) -> SnowflakeId {
        debug_assert!(timestamp <= self.max_timestamp(), "timestamp overflow");
        debug_assert!(node.datacenter <= self.max_datacenter(), "datacenter overflow");
        debug_assert!(node.server <= self.max_server(), "server overflow");
        debug_assert!(sequence <= self.max_sequence(), "sequence overflow");

        let timestamp = (timestamp & self.max_timestamp()) << self.timestamp_shift();
        let datacenter = (node.datacenter & self.max_datacenter()) << self.datacenter_shift();
        let server = (node.server & self.max_server()) << self.server_shift();
        let sequence = sequence & self.max_sequence();
        SnowflakeId::from_raw((timestamp | datacenter | server | sequence) as i64)
    }

    /// Unpacks an ID produced under this layout.
    pub const fn decode(&self, id: SnowflakeId) -> Components {
        let raw = id.to_raw() as u64;
        Components {
            timestamp: (raw >> self.timestamp_shift()) & self.max_timestamp(),
            datacenter: (raw >> self.datacenter_shift()) & self.max_datacenter(),
            server: (raw >> self.server_shift()) & self.max_server(),
            sequence: raw & self.max_sequence(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twitter_layout_matches_classic_shifts() {
        let layout = Layout::TWITTER;
        assert_eq!(layout.timestamp_bits(), 41);
        assert_eq!(layout.timestamp_shift(), 22);
        assert_eq!(layout.server_shift(), 12);
        assert_eq!(layout.max_server(), 1023);
        assert_eq!(layout.max_sequence(), 4095);
        assert_eq!(layout.max_datacenter(), 0);
        assert!(layout.is_flat());
    }

    #[test]
    fn datacenter_layout_stacks_datacenter_above_server() {
        let layout = Layout::DATACENTER;
        assert_eq!(layout.timestamp_bits(), 41);
        assert_eq!(layout.server_shift(), 12);
        assert_eq!(layout.datacenter_shift(), 17);
        assert_eq!(layout.timestamp_shift(), 22);
        assert_eq!(layout.max_datacenter(), 31);
        assert_eq!(layout.max_server(), 31);
        assert!(!layout.is_flat());

        let id = layout.encode(0, NodeId::split(1, 0), 0);
        assert_eq!(id.to_raw(), 1 << 17);
        let id = layout.encode(0, NodeId::split(0, 1), 0);
        assert_eq!(id.to_raw(), 1 << 12);
    }

    #[test]
    fn encode_places_fields_like_the_reference_packing() {
        // (t - epoch) << 22 | server << 12 | sequence
        let id = Layout::TWITTER.encode(123_456_789, NodeId::flat(513), 77);
        assert_eq!(id.to_raw(), (123_456_789_i64 << 22) | (513 << 12) | 77);
    }

    #[test]
    fn decode_recovers_encoded_fields() {
        let layouts = [
            Layout::TWITTER,
            Layout::DATACENTER,
            Layout::new(3, 7, 9).unwrap(),
        ];
        for layout in layouts {
            let cases = [
                (0, NodeId::default(), 0),
                (
                    layout.max_timestamp(),
                    NodeId::split(layout.max_datacenter(), layout.max_server()),
                    layout.max_sequence(),
                ),
                (
                    layout.max_timestamp() / 3,
                    NodeId::split(layout.max_datacenter() / 2, 1),
                    layout.max_sequence() / 2,
                ),
            ];
            for (timestamp, node, sequence) in cases {
                let id = layout.encode(timestamp, node, sequence);
                assert!(id.to_raw() >= 0, "{layout:?} produced a negative id");
                let parts = layout.decode(id);
                assert_eq!(parts.timestamp, timestamp);
                assert_eq!(parts.datacenter, node.datacenter);
                assert_eq!(parts.server, node.server);
                assert_eq!(parts.sequence, sequence);
            }
        }
    }

    #[test]
    fn max_timestamp_keeps_sign_bit_clear() {
        let layout = Layout::TWITTER;
        let id = layout.encode(
            layout.max_timestamp(),
            NodeId::flat(layout.max_server()),
            layout.max_sequence(),
        );
        assert_eq!(id.to_raw(), i64::MAX);
    }

    #[test]
    fn layout_rejects_missing_sequence_and_timestamp_bits() {
        assert!(matches!(
            Layout::new(0, 10, 0),
            Err(Error::InvalidLayout { .. })
        ));
        assert!(matches!(
            Layout::new(20, 20, 23),
            Err(Error::InvalidLayout { .. })
        ));
        let widest = Layout::new(20, 20, 22).unwrap();
        assert_eq!(widest.timestamp_bits(), 1);
    }

    #[test]
    fn validate_node_checks_each_field() {
        let layout = Layout::DATACENTER;
        assert!(layout.validate_node(NodeId::split(31, 31)).is_ok());
        assert_eq!(
            layout.validate_node(NodeId::split(32, 0)),
            Err(Error::InvalidIdentifier {
                field: Field::Datacenter,
                value: 32,
                max: 31
            })
        );
        assert_eq!(
            layout.validate_node(NodeId::split(0, 32)),
            Err(Error::InvalidIdentifier {
                field: Field::Server,
                value: 32,
                max: 31
            })
        );
        assert!(matches!(
            Layout::TWITTER.validate_node(NodeId::split(1, 0)),
            Err(Error::InvalidIdentifier {
                field: Field::Datacenter,
                ..
            })
        ));
    }

    #[test]
    fn node_offset_saturates() {
        assert_eq!(NodeId::split(2, 5).offset(3), NodeId::split(2, 8));
        assert_eq!(NodeId::flat(u64::MAX).offset(1).server, u64::MAX);
    }
}
