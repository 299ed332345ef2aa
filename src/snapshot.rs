//! Module: snapshot
//!
//! Purpose: InputSnapshot, the fixed-layout record describing every pad input
//! at one instant, plus the typed button set it is built from.
//!
//! Architecture:
//! - Internally buttons are a typed set of "pressed" flags (`PressedButtons`)
//! - Active-low packing happens in exactly one place: `InputSnapshot::encode`
//! - The packed layout is what crosses the core boundary (8 bytes, `repr(C)`)
//!
//! Safety: `as_bytes` reinterprets an all-`u8` `repr(C)` struct; no other unsafe.

/// Analog axis value for a centered stick.
pub const NEUTRAL_AXIS: u8 = 0x80;

/// Trigger magnitude when the trigger line is asserted.
pub const TRIGGER_PRESSED: u8 = 0xFF;

/// Trigger magnitude when the trigger line is released.
pub const TRIGGER_RELEASED: u8 = 0x00;

/// Size of the packed snapshot in bytes.
pub const SNAPSHOT_SIZE: usize = 8;

/// One instant of pad state, exactly as the responder sends it.
///
/// Digital groups are active-low: a cleared bit means "pressed".
///
/// Memory layout:
/// ```text
/// [group_a][group_b][l2][r2][lx][ly][rx][ry] = 8 bytes
/// ```
///
/// Group A (bit 0 → 7): Select, reserved, reserved, Start, Up, Right, Down, Left
///
/// Group B (bit 0 → 7): L2, R2, L1, R1, Triangle, Circle, Cross, Square
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct InputSnapshot {
    /// D-pad, Start and Select (active-low)
    pub buttons_group_a: u8,

    /// Face and shoulder buttons (active-low)
    pub buttons_group_b: u8,

    /// L2 depth: 0x00 released, 0xFF pressed (never anything in between)
    pub left_trigger_analog: u8,

    /// R2 depth: 0x00 released, 0xFF pressed (never anything in between)
    pub right_trigger_analog: u8,

    /// Left stick X, fixed at `NEUTRAL_AXIS`
    pub left_stick_x: u8,

    /// Left stick Y, fixed at `NEUTRAL_AXIS`
    pub left_stick_y: u8,

    /// Right stick X, fixed at `NEUTRAL_AXIS`
    pub right_stick_x: u8,

    /// Right stick Y, fixed at `NEUTRAL_AXIS`
    pub right_stick_y: u8,
}

const _: () = assert!(core::mem::size_of::<InputSnapshot>() == SNAPSHOT_SIZE);
const _: () = assert!(core::mem::align_of::<InputSnapshot>() == 1);

impl InputSnapshot {
    /// Nothing pressed, triggers released, sticks centered.
    pub const RELEASED: Self = Self {
        buttons_group_a: 0xFF,
        buttons_group_b: 0xFF,
        left_trigger_analog: TRIGGER_RELEASED,
        right_trigger_analog: TRIGGER_RELEASED,
        left_stick_x: NEUTRAL_AXIS,
        left_stick_y: NEUTRAL_AXIS,
        right_stick_x: NEUTRAL_AXIS,
        right_stick_y: NEUTRAL_AXIS,
    };

    /// Pack a set of pressed buttons into the active-low wire form.
    ///
    /// Starts from `RELEASED` and clears one bit per pressed button. L2/R2
    /// additionally drive their analog trigger field (binary only).
    pub const fn encode(pressed: PressedButtons) -> Self {
        let mut snapshot = Self::RELEASED;

        let mut i = 0;
        while i < Button::COUNT {
            let button = Button::ALL[i];
            if pressed.contains(button) {
                match button.group() {
                    ButtonGroup::A => snapshot.buttons_group_a &= !button.mask(),
                    ButtonGroup::B => snapshot.buttons_group_b &= !button.mask(),
                }
            }
            i += 1;
        }

        if pressed.contains(Button::L2) {
            snapshot.left_trigger_analog = TRIGGER_PRESSED;
        }
        if pressed.contains(Button::R2) {
            snapshot.right_trigger_analog = TRIGGER_PRESSED;
        }

        snapshot
    }

    /// Decode the digital groups back into a typed set.
    ///
    /// Reserved group A bits are ignored.
    pub const fn pressed(&self) -> PressedButtons {
        let mut pressed = PressedButtons::NONE;

        let mut i = 0;
        while i < Button::COUNT {
            let button = Button::ALL[i];
            let bits = match button.group() {
                ButtonGroup::A => self.buttons_group_a,
                ButtonGroup::B => self.buttons_group_b,
            };
            if bits & button.mask() == 0 {
                pressed = pressed.with(button);
            }
            i += 1;
        }

        pressed
    }

    /// Check if a single button reads as pressed.
    #[inline]
    pub const fn is_pressed(&self, button: Button) -> bool {
        self.pressed().contains(button)
    }

    /// Raw bytes in wire order.
    #[inline]
    pub fn as_bytes(&self) -> &[u8; SNAPSHOT_SIZE] {
        // SAFETY: repr(C), eight u8 fields, size 8 and align 1 (asserted above).
        unsafe { &*(self as *const Self as *const [u8; SNAPSHOT_SIZE]) }
    }

    /// Rebuild a snapshot from raw bytes in wire order.
    #[inline]
    pub const fn from_bytes(bytes: [u8; SNAPSHOT_SIZE]) -> Self {
        Self {
            buttons_group_a: bytes[0],
            buttons_group_b: bytes[1],
            left_trigger_analog: bytes[2],
            right_trigger_analog: bytes[3],
            left_stick_x: bytes[4],
            left_stick_y: bytes[5],
            right_stick_x: bytes[6],
            right_stick_y: bytes[7],
        }
    }
}

impl Default for InputSnapshot {
    fn default() -> Self {
        Self::RELEASED
    }
}

/// Which packed byte a button lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ButtonGroup {
    A,
    B,
}

/// Every digital input the pad exposes.
///
/// Discriminants are the slot order used by `LineMap`.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Button {
    Circle = 0,
    Cross = 1,
    Triangle = 2,
    Square = 3,
    L1 = 4,
    R1 = 5,
    L2 = 6,
    R2 = 7,
    Up = 8,
    Down = 9,
    Left = 10,
    Right = 11,
    Start = 12,
    Select = 13,
}

impl Button {
    /// Number of mappable buttons.
    pub const COUNT: usize = 14;

    /// All buttons in slot order.
    pub const ALL: [Button; Button::COUNT] = [
        Button::Circle,
        Button::Cross,
        Button::Triangle,
        Button::Square,
        Button::L1,
        Button::R1,
        Button::L2,
        Button::R2,
        Button::Up,
        Button::Down,
        Button::Left,
        Button::Right,
        Button::Start,
        Button::Select,
    ];

    /// Button for a slot index, if the index is in range.
    pub const fn from_slot(slot: usize) -> Option<Self> {
        if slot < Self::COUNT {
            Some(Self::ALL[slot])
        } else {
            None
        }
    }

    /// Slot index of this button.
    #[inline]
    pub const fn slot(self) -> usize {
        self as usize
    }

    /// Packed byte this button is reported in.
    pub const fn group(self) -> ButtonGroup {
        match self {
            Button::Up
            | Button::Down
            | Button::Left
            | Button::Right
            | Button::Start
            | Button::Select => ButtonGroup::A,
            _ => ButtonGroup::B,
        }
    }

    /// Bit mask inside its group.
    pub const fn mask(self) -> u8 {
        match self {
            // Group A
            Button::Select => 0x01,
            Button::Start => 0x08,
            Button::Up => 0x10,
            Button::Right => 0x20,
            Button::Down => 0x40,
            Button::Left => 0x80,
            // Group B
            Button::L2 => 0x01,
            Button::R2 => 0x02,
            Button::L1 => 0x04,
            Button::R1 => 0x08,
            Button::Triangle => 0x10,
            Button::Circle => 0x20,
            Button::Cross => 0x40,
            Button::Square => 0x80,
        }
    }

    /// Triggers also report an analog magnitude.
    #[inline]
    pub const fn is_trigger(self) -> bool {
        matches!(self, Button::L2 | Button::R2)
    }

    /// Short display name.
    pub const fn name(self) -> &'static str {
        match self {
            Button::Circle => "circle",
            Button::Cross => "cross",
            Button::Triangle => "triangle",
            Button::Square => "square",
            Button::L1 => "l1",
            Button::R1 => "r1",
            Button::L2 => "l2",
            Button::R2 => "r2",
            Button::Up => "up",
            Button::Down => "down",
            Button::Left => "left",
            Button::Right => "right",
            Button::Start => "start",
            Button::Select => "select",
        }
    }
}

/// Set of currently pressed buttons.
///
/// Bit N = button in slot N is pressed (active-high, unlike the wire form).
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PressedButtons(u16);

impl PressedButtons {
    /// Nothing pressed.
    pub const NONE: Self = Self(0);

    /// Every mappable button pressed.
    pub const ALL: Self = Self((1 << Button::COUNT) - 1);

    /// Create from raw slot bits (bits above slot 13 are dropped).
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits & Self::ALL.0)
    }

    /// Get raw slot bits.
    pub const fn bits(&self) -> u16 {
        self.0
    }

    /// Check if a button is in the set.
    #[inline]
    pub const fn contains(&self, button: Button) -> bool {
        self.0 & (1 << button as u16) != 0
    }

    /// Copy of the set with `button` added.
    #[inline]
    pub const fn with(self, button: Button) -> Self {
        Self(self.0 | (1 << button as u16))
    }

    /// Copy of the set with `button` removed.
    #[inline]
    pub const fn without(self, button: Button) -> Self {
        Self(self.0 & !(1 << button as u16))
    }

    /// Add or remove a button in place.
    #[inline]
    pub fn set(&mut self, button: Button, pressed: bool) {
        *self = if pressed { self.with(button) } else { self.without(button) };
    }

    /// Check if nothing is pressed.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Number of pressed buttons.
    #[inline]
    pub const fn len(&self) -> u32 {
        self.0.count_ones()
    }

    /// Iterate pressed buttons in slot order.
    pub fn iter(self) -> impl Iterator<Item = Button> {
        Button::ALL.into_iter().filter(move |b| self.contains(*b))
    }
}

impl FromIterator<Button> for PressedButtons {
    fn from_iter<I: IntoIterator<Item = Button>>(iter: I) -> Self {
        iter.into_iter().fold(Self::NONE, Self::with)
    }
}

// ============================================================================
// Tests
// ============================================================================
