mod reformat;
