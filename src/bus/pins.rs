/// Pin assignment between the GPIO header and the host's parallel port

/// Handshake lines as seen from the unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line {
    /// ATN: the host has a command byte for us (sensed only)
    Attention,
    /// DAV: data on the lines is valid
    DataValid,
    /// RFD: ready for data
    ReadyForData,
    /// DAC: data accepted
    DataAccepted,
    /// Host reset, active low (sensed only)
    Reset,
}

impl Line {
    /// Short signal name used in traces
    pub fn name(&self) -> &'static str {
        match self {
            Line::Attention => "ATN",
            Line::DataValid => "DAV",
            Line::ReadyForData => "RFD",
            Line::DataAccepted => "DAC",
            Line::Reset => "RST",
        }
    }
}

impl std::fmt::Display for Line {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// GPIO numbers of every bus signal
///
/// Inputs are what the unit senses (driven by the host), outputs are what
/// the unit drives. The same handshake line exists once in each direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinMap {
    /// First pin of the 8-bit inbound data field (host PB7-PB0)
    pub data_in: u32,
    /// First pin of the 8-bit outbound data field (host PA0-PA7)
    pub data_out: u32,
    /// Sensed DAV (host PC4)
    pub dav_in: u32,
    /// Sensed RFD (host PC5)
    pub rfd_in: u32,
    /// Sensed DAC (host PC6)
    pub dac_in: u32,
    /// Sensed ATN (host PC7)
    pub atn_in: u32,
    /// Driven DAV (host PC0)
    pub dav_out: u32,
    /// Driven RFD (host PC1)
    pub rfd_out: u32,
    /// Driven DAC (host PC2)
    pub dac_out: u32,
    /// Sensed host reset
    pub reset_in: u32,
}

impl PinMap {
    /// Width of each data field
    pub const DATA_WIDTH: u32 = 8;

    /// Wiring of the PC-80S31 adapter board
    pub const PC80S31: PinMap = PinMap {
        data_in: 4,
        data_out: 12,
        dav_in: 20,
        rfd_in: 21,
        dac_in: 22,
        atn_in: 23,
        dav_out: 24,
        rfd_out: 25,
        dac_out: 26,
        reset_in: 27,
    };

    /// Pin the unit samples for `line`
    pub fn sensed(&self, line: Line) -> u32 {
        match line {
            Line::Attention => self.atn_in,
            Line::DataValid => self.dav_in,
            Line::ReadyForData => self.rfd_in,
            Line::DataAccepted => self.dac_in,
            Line::Reset => self.reset_in,
        }
    }

    /// Pin the unit drives for `line`, if it drives it at all
    pub fn driven(&self, line: Line) -> Option<u32> {
        match line {
            Line::DataValid => Some(self.dav_out),
            Line::ReadyForData => Some(self.rfd_out),
            Line::DataAccepted => Some(self.dac_out),
            Line::Attention | Line::Reset => None,
        }
    }

    /// Inbound fields as (first pin, width)
    pub fn input_fields(&self) -> [(u32, u32); 6] {
        [
            (self.data_in, Self::DATA_WIDTH),
            (self.dav_in, 1),
            (self.rfd_in, 1),
            (self.dac_in, 1),
            (self.atn_in, 1),
            (self.reset_in, 1),
        ]
    }

    /// Outbound fields as (first pin, width)
    pub fn output_fields(&self) -> [(u32, u32); 4] {
        [
            (self.data_out, Self::DATA_WIDTH),
            (self.dav_out, 1),
            (self.rfd_out, 1),
            (self.dac_out, 1),
        ]
    }
}

impl Default for PinMap {
    fn default() -> Self {
        Self::PC80S31
    }
}
