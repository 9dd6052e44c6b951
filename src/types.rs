// Core UI types for pdf-highlights

// App state flags using bitflags
bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AppFlags: u8 {
        const EXIT      = 0b0001;
        const REDRAW    = 0b0010;
    }
}
