use crate::domain::model::SdParams;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_positive_number, validate_range, Validate,
};

pub const DEFAULT_PROMPT: &str = "portrait photo of muscular bearded guy in a worn mech suit, light bokeh, intricate, steel metal, elegant, sharp focus, soft lighting, vibrant colors";

impl SdParams {
    /// Command line for stable-diffusion.cpp's `sd` binary.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            "-m".to_string(),
            self.model.clone(),
            "-p".to_string(),
            self.prompt.clone(),
            "-o".to_string(),
            self.output.display().to_string(),
            "--cfg-scale".to_string(),
            self.cfg_scale.to_string(),
            "--sampling-method".to_string(),
            self.sampling_method.clone(),
            "--steps".to_string(),
            self.steps.to_string(),
            "--seed".to_string(),
            self.seed.to_string(),
            "--schedule".to_string(),
            self.schedule.clone(),
            "-W".to_string(),
            self.width.to_string(),
            "-H".to_string(),
            self.height.to_string(),
            "--clip-skip".to_string(),
            self.clip_skip.to_string(),
        ];

        let optional = [
            ("-n", self.negative_prompt.as_ref()),
            ("--vae", self.vae.as_ref()),
            ("-i", self.init_image.as_ref()),
            ("-M", self.mode.as_ref()),
        ];
        for (flag, value) in optional {
            if let Some(value) = value.filter(|v| !v.is_empty()) {
                args.push(flag.to_string());
                args.push(value.clone());
            }
        }

        if let Some(threads) = self.threads {
            args.push("-t".to_string());
            args.push(threads.to_string());
        }

        args
    }
}

impl Validate for SdParams {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("imagegen.model", &self.model)?;
        validate_non_empty_string("prompt", &self.prompt)?;
        validate_path("imagegen.output", &self.output.to_string_lossy())?;
        validate_positive_number("imagegen.steps", self.steps as usize, 1)?;
        validate_range("imagegen.cfg_scale", self.cfg_scale, 0.0, 30.0)?;
        // sd 要求寬高為 64 的倍數
        for (field, value) in [("imagegen.width", self.width), ("imagegen.height", self.height)] {
            validate_range(field, value, 64, 4096)?;
            if value % 64 != 0 {
                return Err(crate::utils::error::ToolError::InvalidConfigValueError {
                    field: field.to_string(),
                    value: value.to_string(),
                    reason: "Value must be a multiple of 64".to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn params() -> SdParams {
        SdParams {
            model: "/models/dreamshaper.safetensors".to_string(),
            prompt: DEFAULT_PROMPT.to_string(),
            negative_prompt: None,
            vae: None,
            init_image: None,
            mode: None,
            output: PathBuf::from("./image.png"),
            cfg_scale: 2.0,
            steps: 6,
            seed: 0,
            sampling_method: "dpm++2m".to_string(),
            schedule: "karras".to_string(),
            width: 512,
            height: 512,
            clip_skip: 1,
            threads: None,
        }
    }

    fn value_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .map(String::as_str)
    }

    #[test]
    fn test_required_arguments() {
        let args = params().to_args();
        assert_eq!(value_after(&args, "-m"), Some("/models/dreamshaper.safetensors"));
        assert_eq!(value_after(&args, "-p"), Some(DEFAULT_PROMPT));
        assert_eq!(value_after(&args, "-o"), Some("./image.png"));
        assert_eq!(value_after(&args, "--steps"), Some("6"));
        assert_eq!(value_after(&args, "--cfg-scale"), Some("2"));
        assert_eq!(value_after(&args, "--seed"), Some("0"));
        assert_eq!(value_after(&args, "--sampling-method"), Some("dpm++2m"));
        assert_eq!(value_after(&args, "--schedule"), Some("karras"));
        assert!(!args.contains(&"--vae".to_string()));
    }

    #[test]
    fn test_optional_arguments() {
        let mut p = params();
        p.vae = Some("/models/vae.safetensors".to_string());
        p.negative_prompt = Some("blurry".to_string());
        p.init_image = Some(String::new());
        p.threads = Some(8);

        let args = p.to_args();
        assert_eq!(value_after(&args, "--vae"), Some("/models/vae.safetensors"));
        assert_eq!(value_after(&args, "-n"), Some("blurry"));
        assert_eq!(value_after(&args, "-t"), Some("8"));
        assert!(!args.contains(&"-i".to_string()));
    }

    #[test]
    fn test_validation() {
        assert!(params().validate().is_ok());

        let mut p = params();
        p.model = String::new();
        assert!(p.validate().is_err());

        let mut p = params();
        p.width = 500;
        assert!(p.validate().is_err());

        let mut p = params();
        p.steps = 0;
        assert!(p.validate().is_err());
    }
}
