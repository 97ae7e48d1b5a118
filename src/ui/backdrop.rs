use clap::ValueEnum;
use rand::seq::SliceRandom;
use ratatui::style::Color;

/// Color scheme picked once per launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backdrop {
    Winter,
    Spring,
    Summer,
    Autumn,
    Bridge,
    Fog,
}

pub struct Palette {
    pub background: Color,
    pub title: Color,
    pub border: Color,
    pub accent: Color,
}

impl Backdrop {
    pub const ALL: [Backdrop; 6] = [
        Backdrop::Winter,
        Backdrop::Spring,
        Backdrop::Summer,
        Backdrop::Autumn,
        Backdrop::Bridge,
        Backdrop::Fog,
    ];

    pub fn random() -> Self {
        let mut rng = rand::thread_rng();
        Self::ALL.choose(&mut rng).copied().unwrap_or(Backdrop::Fog)
    }

    pub fn name(self) -> &'static str {
        match self {
            Backdrop::Winter => "winter",
            Backdrop::Spring => "spring",
            Backdrop::Summer => "summer",
            Backdrop::Autumn => "autumn",
            Backdrop::Bridge => "bridge",
            Backdrop::Fog => "fog",
        }
    }

    pub fn palette(self) -> Palette {
        match self {
            Backdrop::Winter => Palette {
                background: Color::Rgb(24, 38, 58),
                title: Color::White,
                border: Color::LightCyan,
                accent: Color::Cyan,
            },
            Backdrop::Spring => Palette {
                background: Color::Rgb(28, 52, 34),
                title: Color::White,
                border: Color::LightGreen,
                accent: Color::LightMagenta,
            },
            Backdrop::Summer => Palette {
                background: Color::Rgb(20, 60, 80),
                title: Color::White,
                border: Color::LightYellow,
                accent: Color::Yellow,
            },
            Backdrop::Autumn => Palette {
                background: Color::Rgb(64, 32, 18),
                title: Color::White,
                border: Color::LightRed,
                accent: Color::Rgb(255, 165, 0),
            },
            Backdrop::Bridge => Palette {
                background: Color::Rgb(36, 36, 44),
                title: Color::White,
                border: Color::Gray,
                accent: Color::LightBlue,
            },
            Backdrop::Fog => Palette {
                background: Color::Rgb(70, 74, 78),
                title: Color::White,
                border: Color::White,
                accent: Color::LightCyan,
            },
        }
    }
}
