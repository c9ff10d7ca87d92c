// File: tunebot-core/src/coordinator/messages.rs
//
// Everything a requester can read. Raw errors never go in here.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    En,
    Ru,
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locale::En => write!(f, "en"),
            Locale::Ru => write!(f, "ru"),
        }
    }
}

impl FromStr for Locale {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(Locale::En),
            "ru" | "russian" => Ok(Locale::Ru),
            other => Err(format!("Unknown locale: {other}")),
        }
    }
}

impl Locale {
    pub fn playing_link(&self, url: &str) -> String {
        match self {
            Locale::En => format!("Playing music from URL: {url}"),
            Locale::Ru => format!("Воспроизвожу музыку по URL: {url}"),
        }
    }

    pub fn found_video(&self, title: &str) -> String {
        match self {
            Locale::En => format!("Found video: **{title}**. Playing..."),
            Locale::Ru => format!("Нашёл видео: **{title}**. Воспроизвожу..."),
        }
    }

    pub fn not_found(&self) -> String {
        match self {
            Locale::En => "No video found for that query.".into(),
            Locale::Ru => "Видео не найдено по данному запросу.".into(),
        }
    }

    pub fn search_error(&self) -> String {
        match self {
            Locale::En => "Something went wrong while searching for the video.".into(),
            Locale::Ru => "Произошла ошибка при поиске видео.".into(),
        }
    }

    pub fn download_error(&self) -> String {
        match self {
            Locale::En => "Something went wrong while downloading the music. Check that the URL is correct.".into(),
            Locale::Ru => "Произошла ошибка при скачивании музыки. Проверьте, правильный ли URL.".into(),
        }
    }

    pub fn join_voice_first(&self) -> String {
        match self {
            Locale::En => "You need to be in a voice channel to play music!".into(),
            Locale::Ru => "Вы должны быть в голосовом канале, чтобы воспроизвести музыку!".into(),
        }
    }

    pub fn playback_error(&self) -> String {
        match self {
            Locale::En => "Something went wrong during playback.".into(),
            Locale::Ru => "Произошла ошибка воспроизведения.".into(),
        }
    }

    pub fn finished(&self, name: &str) -> String {
        match self {
            Locale::En => format!("Finished playing: {name}"),
            Locale::Ru => format!("Воспроизведение завершено: {name}"),
        }
    }

    pub fn unknown_command(&self, name: &str) -> String {
        match self {
            Locale::En => format!("Unrecognized command: {name}"),
            Locale::Ru => format!("Неизвестная команда: {name}"),
        }
    }
}
