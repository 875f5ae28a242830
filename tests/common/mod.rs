#![allow(dead_code)]

use image::{DynamicImage, GrayImage, Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use plate_reader::engine::{PageMode, RecognizerConfig, TextRecognizer};
use plate_reader::{LprError, PlatePipeline, Settings};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Where the synthetic plate sits in the 1600x1200 test photo
pub const PLATE: (i32, i32, u32, u32) = (400, 500, 450, 100);
pub const GLYPHS: usize = 6;

/// Dark scene with one light 4.5:1 plate carrying six dark glyph bars
pub fn plate_photo() -> DynamicImage {
    let mut img = RgbImage::from_pixel(1600, 1200, Rgb([60, 60, 60]));
    let (x, y, w, h) = PLATE;
    draw_filled_rect_mut(&mut img, Rect::at(x, y).of_size(w, h), Rgb([235, 235, 235]));
    for i in 0..GLYPHS as i32 {
        draw_filled_rect_mut(
            &mut img,
            Rect::at(x + 30 + i * 70, y + 20).of_size(20, 60),
            Rgb([20, 20, 20]),
        );
    }
    DynamicImage::ImageRgb8(img)
}

pub fn blank_photo() -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(1600, 1200, Rgb([128, 128, 128])))
}

pub fn png_bytes(image: &DynamicImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

pub enum Script {
    /// Same text for every call
    Text(&'static str),
    /// One character per call, cycling
    Chars(&'static str),
    Fail { fatal: bool },
    /// Panics inside the recognition call
    Panic,
}

/// In-process recognizer returning scripted output and recording its calls
pub struct ScriptedRecognizer {
    script: Script,
    calls: AtomicUsize,
    modes: Mutex<Vec<PageMode>>,
}

impl ScriptedRecognizer {
    pub fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: AtomicUsize::new(0),
            modes: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn modes(&self) -> Vec<PageMode> {
        self.modes.lock().unwrap().clone()
    }
}

impl TextRecognizer for ScriptedRecognizer {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn description(&self) -> &'static str {
        "Scripted recognizer for tests"
    }

    fn recognize(&self, _image: &GrayImage, config: &RecognizerConfig) -> Result<String, LprError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.modes.lock().unwrap().push(config.page_mode);
        match &self.script {
            Script::Text(text) => Ok(text.to_string()),
            Script::Chars(chars) => {
                let chars: Vec<char> = chars.chars().collect();
                Ok(chars[call % chars.len()].to_string())
            }
            Script::Fail { fatal: true } => Err(LprError::Initialization("no language data".into())),
            Script::Fail { fatal: false } => Err(LprError::Recognition("engine hiccup".into())),
            Script::Panic => panic!("recognizer crashed"),
        }
    }

    fn supported_languages(&self) -> Vec<String> {
        vec!["eng".to_string()]
    }
}

pub fn pipeline_with(recognizer: Arc<ScriptedRecognizer>, settings: Settings) -> PlatePipeline {
    PlatePipeline::new(settings, recognizer, RecognizerConfig::default(), None).unwrap()
}
