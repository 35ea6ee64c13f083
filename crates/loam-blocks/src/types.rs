/// Global block state id. The registry owns the id space; state 0 is
/// always air.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockState(pub u16);

impl BlockState {
    pub const AIR: BlockState = BlockState(0);

    #[inline]
    pub const fn id(self) -> u16 {
        self.0
    }

    #[inline]
    pub const fn is_air(self) -> bool {
        self.0 == 0
    }
}

impl From<u16> for BlockState {
    fn from(value: u16) -> Self {
        BlockState(value)
    }
}

impl From<BlockState> for u16 {
    fn from(value: BlockState) -> Self {
        value.0
    }
}
