#![allow(dead_code)]

use lopdf::{dictionary, Dictionary, Document, Object, Stream};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tesspage::{EngineCommand, Tesseract};

const PRELUDE: &str = r#"
echo "$*" >> "@DIR@/calls.log"
case "$1" in
  --version) printf 'tesseract @VERSION@\n leptonica-1.79.0\n'; exit 0;;
  --list-langs) printf 'List of available languages (3):\ndeu\neng\nosd\n'; exit 0;;
  --print-parameters) printf '@PARAMS@'; exit 0;;
esac
prev=""; prev2=""
for a in "$@"; do
  case "$a" in
    hocr|pdf|stdout) if [ -z "$FORMAT" ]; then FORMAT="$a"; OUT_BASE="$prev"; IN="$prev2"; fi;;
  esac
  prev2="$prev"; prev="$a"
done
"#;

/// A shell script standing in for the tesseract binary. Every call is
/// appended to `calls.log`; `body` runs for page invocations with
/// `$FORMAT` set to the output format and `$OUT_BASE`/`$IN` to the two
/// arguments before it.
pub struct FakeEngine {
    pub dir: TempDir,
    script: PathBuf,
}

impl FakeEngine {
    pub fn new(version: &str, body: &str) -> Self {
        Self::with_parameters(version, "", body)
    }

    pub fn with_parameters(version: &str, parameters: &str, body: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let prelude = PRELUDE
            .replace("@DIR@", &dir.path().display().to_string())
            .replace("@VERSION@", version)
            .replace("@PARAMS@", parameters);
        Self::from_parts(dir, &format!("{prelude}\n{body}\n"))
    }

    /// A script that replaces the whole prelude.
    pub fn raw(script: &str) -> Self {
        Self::from_parts(TempDir::new().unwrap(), script)
    }

    fn from_parts(dir: TempDir, script: &str) -> Self {
        let path = dir.path().join("fake-tesseract.sh");
        std::fs::write(&path, script).unwrap();
        Self { dir, script: path }
    }

    pub fn tesseract(&self) -> Tesseract {
        Tesseract::new(EngineCommand::new("/bin/sh").with_leading_args([&self.script]))
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn image(&self, name: &str, width: u32, height: u32) -> PathBuf {
        let path = self.path(name);
        image::RgbImage::new(width, height).save(&path).unwrap();
        path
    }

    pub fn calls(&self) -> Vec<String> {
        std::fs::read_to_string(self.path("calls.log"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    pub fn count_calls(&self, flag: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == flag).count()
    }
}

/// A one-page PDF that draws an image XObject, like a rendered scan.
pub fn raster_pdf(path: &Path, width: i64, height: i64) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => 1,
            "Height" => 1,
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 8,
        },
        vec![0u8],
    ));
    let content = format!("q {width} 0 0 {height} 0 0 cm /Im0 Do Q");
    let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![Object::Integer(0), Object::Integer(0), Object::Integer(width), Object::Integer(height)],
        "Resources" => dictionary! {
            "XObject" => dictionary! { "Im0" => image_id },
        },
        "Contents" => content_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}
